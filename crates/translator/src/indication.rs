//! Remote one-character signal codes

use contracts::CoarseIndication;

pub const CODE_RED: &str = "r";
pub const CODE_YELLOW: &str = "y";
pub const CODE_GREEN: &str = "G";
pub const CODE_OFF: &str = "0";

pub fn coarse_to_code(indication: CoarseIndication) -> &'static str {
    match indication {
        CoarseIndication::Red => CODE_RED,
        CoarseIndication::Yellow => CODE_YELLOW,
        CoarseIndication::Green => CODE_GREEN,
        CoarseIndication::Off => CODE_OFF,
    }
}

/// `None` for codes outside the remote vocabulary; case-sensitive
pub fn code_to_coarse(code: &str) -> Option<CoarseIndication> {
    match code {
        CODE_RED => Some(CoarseIndication::Red),
        CODE_YELLOW => Some(CoarseIndication::Yellow),
        CODE_GREEN => Some(CoarseIndication::Green),
        CODE_OFF => Some(CoarseIndication::Off),
        _ => None,
    }
}
