//! Vehicle class vocabularies
//!
//! The remote uses lowercase class strings. Host classes without a remote
//! counterpart map to [`IGNORED_CLASS`], never to a passenger default.

use contracts::VehicleClass;

/// Remote sentinel for classes it should not simulate
pub const IGNORED_CLASS: &str = "ignoring";

/// Host class -> remote class string
pub fn class_to_remote(class: VehicleClass) -> &'static str {
    match class {
        VehicleClass::Car | VehicleClass::AutomatedVehicle => "passenger",
        VehicleClass::LightGoodsVehicle | VehicleClass::WorksVehicle => "delivery",
        VehicleClass::HeavyGoodsVehicle => "truck",
        VehicleClass::PublicTransportVehicle => "bus",
        VehicleClass::EmergencyVehicle => "emergency",
        VehicleClass::VehicleWithTrailer => "trailer",
        VehicleClass::MiniBus => "coach",
        VehicleClass::Taxi => "taxi",
        VehicleClass::ElectricVehicle => "evehicle",
        VehicleClass::Bicycle => "bicycle",
        VehicleClass::Motorcycle => "motorcycle",
        VehicleClass::HighOccupancyVehicle => "hov",
        VehicleClass::Unknown
        | VehicleClass::ExceptionalSizeVehicle
        | VehicleClass::HighSideVehicle => IGNORED_CLASS,
    }
}

/// Remote class string -> host class; unrecognised strings are `Unknown`
pub fn class_from_remote(class: &str) -> VehicleClass {
    match class {
        "passenger" => VehicleClass::Car,
        "delivery" => VehicleClass::LightGoodsVehicle,
        "truck" => VehicleClass::HeavyGoodsVehicle,
        "bus" => VehicleClass::PublicTransportVehicle,
        "emergency" => VehicleClass::EmergencyVehicle,
        "trailer" => VehicleClass::VehicleWithTrailer,
        "coach" => VehicleClass::MiniBus,
        "taxi" => VehicleClass::Taxi,
        "evehicle" => VehicleClass::ElectricVehicle,
        "bicycle" => VehicleClass::Bicycle,
        "motorcycle" => VehicleClass::Motorcycle,
        "hov" => VehicleClass::HighOccupancyVehicle,
        _ => VehicleClass::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_is_ignored_not_passenger() {
        assert_eq!(class_to_remote(VehicleClass::Unknown), IGNORED_CLASS);
        assert_eq!(class_to_remote(VehicleClass::HighSideVehicle), IGNORED_CLASS);
        assert_eq!(class_from_remote(IGNORED_CLASS), VehicleClass::Unknown);
        assert_eq!(class_from_remote("hovercraft"), VehicleClass::Unknown);
    }

    #[test]
    fn test_remote_strings_map_back() {
        for remote in [
            "passenger",
            "delivery",
            "truck",
            "bus",
            "emergency",
            "trailer",
            "coach",
            "taxi",
            "evehicle",
            "bicycle",
            "motorcycle",
            "hov",
        ] {
            assert_eq!(class_to_remote(class_from_remote(remote)), remote);
        }
    }

    #[test]
    fn test_many_to_one_classes() {
        assert_eq!(class_to_remote(VehicleClass::AutomatedVehicle), "passenger");
        assert_eq!(class_to_remote(VehicleClass::WorksVehicle), "delivery");
    }
}
