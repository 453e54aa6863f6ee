use serde::{Deserialize, Serialize};

const EARTH_RADIUS_IN_KM: f64 = 6371.0;

/// A point on earth, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance using the haversine formula
    pub fn distance_in_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.).sin().powi(2)
            + self.latitude.to_radians().cos()
                * other.latitude.to_radians().cos()
                * (d_lon / 2.).sin().powi(2);

        EARTH_RADIUS_IN_KM * 2. * a.sqrt().atan2((1. - a).sqrt())
    }

    pub fn is_within(&self, other: &Coordinates, radius_in_km: f64) -> bool {
        self.distance_in_km(other) <= radius_in_km
    }
}
