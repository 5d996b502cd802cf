use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};

use crate::Vector3;

/// A geographic position in degrees.
///
/// No range validation happens here; query parameters are validated before
/// coordinates reach the solver, and plate geometry is taken as given.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Unit vector on the sphere: x toward (0, 0), y toward (0, 90), z toward the north pole.
    pub fn uvec(&self) -> Vector3 {
        let (latsin, latcos) = self.latitude.to_radians().sin_cos();
        let (lonsin, loncos) = self.longitude.to_radians().sin_cos();
        Vector3::new(latcos * loncos, latcos * lonsin, latsin)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}
