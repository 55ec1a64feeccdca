//! Local projection between the shared planar frame and geodetic coordinates
//!
//! Equirectangular approximation around a fixed origin; accurate to well
//! under a meter over a few kilometers, which covers one co-simulated scenario.

use contracts::{GeoOrigin, GeoPoint, Location, VehiclePosition};

/// WGS-84 equatorial radius (m)
const EARTH_RADIUS_M: f64 = 6_378_137.0;
const METERS_PER_LAT_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    origin: GeoOrigin,
    /// meters per degree of longitude at the origin latitude
    meters_per_lon_degree: f64,
}

impl LocalProjection {
    pub fn new(origin: GeoOrigin) -> Self {
        Self {
            origin,
            meters_per_lon_degree: METERS_PER_LAT_DEGREE * origin.latitude.to_radians().cos(),
        }
    }

    pub fn to_geo(&self, location: &Location) -> GeoPoint {
        GeoPoint {
            latitude: self.origin.latitude + location.y / METERS_PER_LAT_DEGREE,
            longitude: self.origin.longitude + location.x / self.meters_per_lon_degree,
            altitude: location.z,
        }
    }

    pub fn to_cartesian(&self, geo: &GeoPoint) -> Location {
        Location {
            x: (geo.longitude - self.origin.longitude) * self.meters_per_lon_degree,
            y: (geo.latitude - self.origin.latitude) * METERS_PER_LAT_DEGREE,
            z: geo.altitude,
        }
    }

    /// Both representations of a Cartesian location
    pub fn position(&self, location: Location) -> VehiclePosition {
        VehiclePosition {
            cartesian: location,
            geo: self.to_geo(&location),
        }
    }
}

impl Default for LocalProjection {
    fn default() -> Self {
        Self::new(GeoOrigin::default())
    }
}
