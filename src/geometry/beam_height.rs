// polar-cartgrid/src/geometry/beam_height.rs

use libm::{atan2, cos, sin, sqrt};

pub const EARTH_RADIUS_KM: f64 = 6375.636;
pub const STANDARD_PSEUDO_EARTH_RATIO: f64 = 4.0 / 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamGeometry {
    pub elevation_deg: f64,
    pub slant_range_km: f64,
    pub gnd_range_km: f64,
}

/// Curved-earth beam propagation using an effective earth radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamHeight {
    pseudo_radius_km: f64,
    instrument_ht_km: f64,
}

impl BeamHeight {
    pub fn new(instrument_ht_km: f64, pseudo_earth_radius_ratio: Option<f64>) -> Self {
        let ratio = pseudo_earth_radius_ratio.unwrap_or(STANDARD_PSEUDO_EARTH_RATIO);
        Self {
            pseudo_radius_km: EARTH_RADIUS_KM * ratio,
            instrument_ht_km,
        }
    }

    pub fn pseudo_radius_km(&self) -> f64 {
        self.pseudo_radius_km
    }

    /// Elevation angle and slant range of the beam that reaches height
    /// `ht_km` (msl) at ground distance `gnd_range_km` from the instrument.
    pub fn compute_elevation(&self, ht_km: f64, gnd_range_km: f64) -> BeamGeometry {
        let r0 = self.pseudo_radius_km + self.instrument_ht_km;
        let r1 = self.pseudo_radius_km + ht_km;
        let theta = gnd_range_km / self.pseudo_radius_km;
        let (sin_theta, cos_theta) = (sin(theta), cos(theta));
        let slant_sq = r0 * r0 + r1 * r1 - 2.0 * r0 * r1 * cos_theta;
        let elevation = atan2(r1 * cos_theta - r0, r1 * sin_theta);
        BeamGeometry {
            elevation_deg: elevation.to_degrees(),
            slant_range_km: sqrt(slant_sq.max(0.0)),
            gnd_range_km,
        }
    }

    /// Height (msl) of the beam at elevation `elevation_deg` after travelling
    /// `slant_range_km`.
    pub fn compute_ht_km(&self, elevation_deg: f64, slant_range_km: f64) -> f64 {
        let r0 = self.pseudo_radius_km + self.instrument_ht_km;
        let sin_el = sin(elevation_deg.to_radians());
        sqrt(slant_range_km * slant_range_km + r0 * r0 + 2.0 * slant_range_km * r0 * sin_el)
            - self.pseudo_radius_km
    }
}
