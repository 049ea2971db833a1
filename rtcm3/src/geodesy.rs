//! ECEF to geodetic conversion on the WGS84 ellipsoid

use core::f64::consts::FRAC_PI_2;

/// WGS84 semi-major axis (m)
pub const WGS84_SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
/// WGS84 flattening
pub const WGS84_FLATTENING: f64 = 1.0 / 298.257_223_563;

const CONVERGENCE: f64 = 1e-4;
const MAX_ITERATIONS: usize = 16;

/// Geodetic coordinates: latitude and longitude in radians, ellipsoidal
/// height in metres
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Geodetic {
    pub latitude: f64,
    pub longitude: f64,
    pub height: f64,
}

impl Geodetic {
    /// (latitude °, longitude °, height m)
    pub fn to_degrees(&self) -> [f64; 3] {
        [
            self.latitude.to_degrees(),
            self.longitude.to_degrees(),
            self.height,
        ]
    }
}

/// Converts an ECEF position (m) to geodetic coordinates.
pub fn ecef_to_geodetic(ecef: [f64; 3]) -> Geodetic {
    let [x, y, z0] = ecef;
    let e2 = WGS84_FLATTENING * (2.0 - WGS84_FLATTENING);
    let r2 = x * x + y * y;

    let mut z = z0;
    let mut v = WGS84_SEMI_MAJOR_AXIS;
    for _ in 0..MAX_ITERATIONS {
        let norm = (r2 + z * z).sqrt();
        if norm == 0.0 {
            break;
        }
        let sinp = z / norm;
        v = WGS84_SEMI_MAJOR_AXIS / (1.0 - e2 * sinp * sinp).sqrt();
        let next = z0 + v * e2 * sinp;
        let done = (next - z).abs() < CONVERGENCE;
        z = next;
        if done {
            break;
        }
    }

    let (latitude, longitude) = if r2 > 1e-12 {
        ((z / r2.sqrt()).atan(), y.atan2(x))
    } else if z0 > 0.0 {
        (FRAC_PI_2, 0.0)
    } else {
        (-FRAC_PI_2, 0.0)
    };
    Geodetic {
        latitude,
        longitude,
        height: (r2 + z * z).sqrt() - v,
    }
}

/// Same as [ecef_to_geodetic] in degrees: `[latitude, longitude, height]`
pub fn ecef_to_lla(ecef: [f64; 3]) -> [f64; 3] {
    ecef_to_geodetic(ecef).to_degrees()
}
