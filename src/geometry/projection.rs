// polar-cartgrid/src/geometry/projection.rs

use crate::params::GridProjection;
use libm::{asin, atan2, cos, sin, sqrt};

pub const GREAT_CIRCLE_RADIUS_KM: f64 = 6371.204;

/// Maps grid (x, y) to latitude/longitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    kind: GridProjection,
    origin_lat: f64,
    origin_lon: f64,
}

impl Projection {
    pub fn new(kind: GridProjection, origin_lat: f64, origin_lon: f64) -> Self {
        Self {
            kind,
            origin_lat,
            origin_lon,
        }
    }

    pub fn kind(&self) -> GridProjection {
        self.kind
    }

    /// Returns `(lat, lon)` in degrees.
    pub fn xy_to_latlon(&self, x: f64, y: f64) -> (f64, f64) {
        match self.kind {
            GridProjection::Flat => {
                let range_km = sqrt(x * x + y * y);
                if range_km == 0.0 {
                    return (self.origin_lat, self.origin_lon);
                }
                let theta_deg = atan2(x, y).to_degrees();
                latlon_plus_r_theta(self.origin_lat, self.origin_lon, range_km, theta_deg)
            }
            GridProjection::LatLon => (y, x),
        }
    }
}

/// Great-circle range (km) and bearing (deg, -180..180) from point 1 to 2.
pub fn latlon_to_r_theta(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> (f64, f64) {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = phi2 - phi1;
    let dlambda = (lon2 - lon1).to_radians();
    let hav = sin(dphi / 2.0).powi(2) + cos(phi1) * cos(phi2) * sin(dlambda / 2.0).powi(2);
    let delta = 2.0 * atan2(sqrt(hav), sqrt((1.0 - hav).max(0.0)));
    let theta = atan2(
        sin(dlambda) * cos(phi2),
        cos(phi1) * sin(phi2) - sin(phi1) * cos(phi2) * cos(dlambda),
    );
    (delta * GREAT_CIRCLE_RADIUS_KM, theta.to_degrees())
}

/// Destination after travelling `range_km` on bearing `theta_deg`.
pub fn latlon_plus_r_theta(lat1: f64, lon1: f64, range_km: f64, theta_deg: f64) -> (f64, f64) {
    let phi1 = lat1.to_radians();
    let lambda1 = lon1.to_radians();
    let delta = range_km / GREAT_CIRCLE_RADIUS_KM;
    let theta = theta_deg.to_radians();
    let sin_phi2 = sin(phi1) * cos(delta) + cos(phi1) * sin(delta) * cos(theta);
    let phi2 = asin(sin_phi2.clamp(-1.0, 1.0));
    let lambda2 = lambda1
        + atan2(
            sin(theta) * sin(delta) * cos(phi1),
            cos(delta) - sin(phi1) * sin_phi2,
        );
    let mut lon2 = lambda2.to_degrees();
    if lon2 > 180.0 {
        lon2 -= 360.0;
    } else if lon2 < -180.0 {
        lon2 += 360.0;
    }
    (phi2.to_degrees(), lon2)
}
