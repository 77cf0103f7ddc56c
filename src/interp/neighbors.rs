// polar-cartgrid/src/interp/neighbors.rs

use crate::search::{Quadrant, SearchPoint};
use libm::sqrt;

const MIN_ANG_DIST: f64 = 0.0001;

/// Angular distance in (elevation, azimuth) degrees, kept away from zero.
pub fn ang_dist(d_el: f64, d_az: f64) -> f64 {
    sqrt(d_el * d_el + d_az * d_az).max(MIN_ANG_DIST)
}

/// Bracketing gates along the beam and their linear weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RangeWeights {
    pub inner_gate: i64,
    pub outer_gate: i64,
    pub inner: f64,
    pub outer: f64,
}

impl RangeWeights {
    pub fn compute(slant_range_km: f64, start_range_km: f64, gate_spacing_km: f64) -> Self {
        let dgate = (slant_range_km - start_range_km) / gate_spacing_km;
        let inner_gate = dgate.floor() as i64;
        let outer = dgate - inner_gate as f64;
        Self {
            inner_gate,
            outer_gate: inner_gate + 1,
            inner: 1.0 - outer,
            outer,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GateWeights {
    pub inner: f64,
    pub outer: f64,
}

/// Inner/outer gate weights for the four quadrant rays, indexed by
/// [`Quadrant::index`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Neighbors {
    pub weights: [GateWeights; 4],
}

impl Neighbors {
    pub fn get(&self, quadrant: Quadrant) -> GateWeights {
        self.weights[quadrant.index()]
    }

    fn set(&mut self, quadrant: Quadrant, angular: f64, range: &RangeWeights) {
        self.weights[quadrant.index()] = GateWeights {
            inner: angular * range.inner,
            outer: angular * range.outer,
        };
    }

    /// Inverse angular distance weighting, used when only two quadrants
    /// hold a ray.
    pub fn for_two_rays(el: f64, az: f64, points: &[SearchPoint; 4], range: &RangeWeights) -> Self {
        let mut neighbors = Self::default();
        for quadrant in Quadrant::ALL {
            let pt = &points[quadrant.index()];
            if pt.has_ray() {
                let wt_dist = 1.0 / ang_dist(el - pt.ray_el, az - pt.ray_az);
                neighbors.set(quadrant, wt_dist, range);
            }
        }
        neighbors
    }

    /// Bilinear weighting: azimuth along the lower and upper pairs first,
    /// then elevation between the two interpolated rows. Uses the
    /// `interp_el`/`interp_az` of each point, so a missing corner must
    /// already be synthesized.
    pub fn for_three_or_four_rays(
        el: f64,
        az: f64,
        points: &[SearchPoint; 4],
        range: &RangeWeights,
    ) -> Self {
        let ll = &points[Quadrant::LowerLeft.index()];
        let ul = &points[Quadrant::UpperLeft.index()];
        let lr = &points[Quadrant::LowerRight.index()];
        let ur = &points[Quadrant::UpperRight.index()];

        let daz_lower = lr.interp_az - ll.interp_az;
        let wt_az_lr = if daz_lower != 0.0 {
            (az - ll.interp_az) / daz_lower
        } else {
            0.5
        };
        let wt_az_ll = 1.0 - wt_az_lr;
        let el_lower = ll.interp_el * wt_az_ll + lr.interp_el * wt_az_lr;

        let daz_upper = ur.interp_az - ul.interp_az;
        let wt_az_ur = if daz_upper != 0.0 {
            (az - ul.interp_az) / daz_upper
        } else {
            0.5
        };
        let wt_az_ul = 1.0 - wt_az_ur;
        let el_upper = ul.interp_el * wt_az_ul + ur.interp_el * wt_az_ur;

        let d_el = el_upper - el_lower;
        let wt_el_upper = if d_el != 0.0 {
            (el - el_lower) / d_el
        } else {
            0.5
        };
        let wt_el_lower = 1.0 - wt_el_upper;

        let mut neighbors = Self::default();
        let angular = [
            (Quadrant::LowerLeft, wt_az_ll * wt_el_lower),
            (Quadrant::UpperLeft, wt_az_ul * wt_el_upper),
            (Quadrant::LowerRight, wt_az_lr * wt_el_lower),
            (Quadrant::UpperRight, wt_az_ur * wt_el_upper),
        ];
        for (quadrant, wt) in angular {
            if points[quadrant.index()].has_ray() {
                neighbors.set(quadrant, wt, range);
            }
        }
        neighbors
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().map(|w| w.inner + w.outer).sum()
    }

    /// Scales the eight weights to sum to one. A zero sum is left alone.
    pub fn normalize(&mut self) {
        let mut sum = self.sum();
        if sum == 0.0 {
            sum = 1.0;
        }
        for w in self.weights.iter_mut() {
            w.inner /= sum;
            w.outer /= sum;
        }
    }
}

/// Gives the one absent corner the angles of its neighbours so the
/// bilinear weights stay defined.
pub fn fill_missing_corner(points: &mut [SearchPoint; 4]) {
    let ll = Quadrant::LowerLeft.index();
    let ul = Quadrant::UpperLeft.index();
    let lr = Quadrant::LowerRight.index();
    let ur = Quadrant::UpperRight.index();
    if !points[ll].has_ray() {
        points[ll].interp_el = points[lr].interp_el;
        points[ll].interp_az = points[ul].interp_az;
    } else if !points[ul].has_ray() {
        points[ul].interp_el = points[ur].interp_el;
        points[ul].interp_az = points[ll].interp_az;
    } else if !points[lr].has_ray() {
        points[lr].interp_el = points[ll].interp_el;
        points[lr].interp_az = points[ur].interp_az;
    } else if !points[ur].has_ray() {
        points[ur].interp_el = points[ul].interp_el;
        points[ur].interp_az = points[lr].interp_az;
    }
}
