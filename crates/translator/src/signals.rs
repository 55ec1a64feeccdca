//! Light / turn-signal bitmask
//!
//! `encode` sums `2^bit` per active flag, `decode` tests each bit.

use contracts::VehicleSignals;

pub const BLINKER_RIGHT_BIT: u32 = 0;
pub const BLINKER_LEFT_BIT: u32 = 1;
pub const BLINKER_EMERGENCY_BIT: u32 = 2;
pub const BRAKE_LIGHT_BIT: u32 = 3;
pub const REVERSE_DRIVE_BIT: u32 = 7;

#[inline]
fn bit(flag: bool, position: u32) -> u32 {
    u32::from(flag) << position
}

#[inline]
fn is_set(mask: u32, position: u32) -> bool {
    (mask >> position) & 1 == 1
}

pub fn encode_signals(signals: &VehicleSignals) -> u32 {
    bit(signals.blinker_right, BLINKER_RIGHT_BIT)
        | bit(signals.blinker_left, BLINKER_LEFT_BIT)
        | bit(signals.blinker_emergency, BLINKER_EMERGENCY_BIT)
        | bit(signals.brake_light, BRAKE_LIGHT_BIT)
        | bit(signals.reverse_drive, REVERSE_DRIVE_BIT)
}

/// Bits outside the five known positions are ignored
pub fn decode_signals(mask: u32) -> VehicleSignals {
    VehicleSignals {
        blinker_right: is_set(mask, BLINKER_RIGHT_BIT),
        blinker_left: is_set(mask, BLINKER_LEFT_BIT),
        blinker_emergency: is_set(mask, BLINKER_EMERGENCY_BIT),
        brake_light: is_set(mask, BRAKE_LIGHT_BIT),
        reverse_drive: is_set(mask, REVERSE_DRIVE_BIT),
    }
}
