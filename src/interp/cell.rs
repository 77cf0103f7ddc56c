// polar-cartgrid/src/interp/cell.rs

use super::accumulate::{Accumulator, Folded, Nearest, WeightedMean};
use super::neighbors::{fill_missing_corner, Neighbors, RangeWeights};
use crate::geometry::GridLoc;
use crate::search::{Quadrant, SearchLimits, SearchMatrix, SearchPoint};
use crate::volume::{FieldKind, GateGeometry, InterpField, InterpRay};
use ndarray::ArrayViewMut1;

pub const DEBUG_FIELD_NAMES: [&str; 12] = [
    "nContrib", "gridAz", "gridEl", "gridRange", "llEl", "llAz", "lrEl", "lrAz", "ulEl", "ulAz",
    "urEl", "urAz",
];

const DEBUG_N_CONTRIB: usize = 0;
const DEBUG_GRID_AZ: usize = 1;
const DEBUG_GRID_EL: usize = 2;
const DEBUG_GRID_RANGE: usize = 3;

fn debug_quadrant_offset(quadrant: Quadrant) -> usize {
    match quadrant {
        Quadrant::LowerLeft => 4,
        Quadrant::LowerRight => 6,
        Quadrant::UpperLeft => 8,
        Quadrant::UpperRight => 10,
    }
}

/// Read-only state shared by every cell of one volume.
pub struct CellInterpolator<'a> {
    pub limits: &'a SearchLimits,
    pub matrix: &'a SearchMatrix,
    pub rays: &'a [InterpRay<'a>],
    pub fields: &'a [InterpField],
    pub kinds: Vec<FieldKind>,
    pub gate_geom: GateGeometry,
    pub beam_width_h_deg: f64,
    pub beam_width_v_deg: f64,
    pub beam_width_fraction: f64,
    pub min_nvalid: usize,
    pub output_debug_fields: bool,
}

impl<'a> CellInterpolator<'a> {
    pub fn n_channels(&self) -> usize {
        if self.output_debug_fields {
            self.fields.len() + DEBUG_FIELD_NAMES.len()
        } else {
            self.fields.len()
        }
    }

    /// Writes one value per field, then the debug channels if enabled.
    /// Channels of an unresolved cell are left untouched, so `out` must be
    /// pre-filled with the missing value.
    pub fn interp_cell(&self, loc: &GridLoc, mut out: ArrayViewMut1<f32>) {
        let n_fields = self.fields.len();
        if self.output_debug_fields {
            out[n_fields + DEBUG_GRID_AZ] = loc.az_deg as f32;
            out[n_fields + DEBUG_GRID_EL] = loc.el_deg as f32;
            out[n_fields + DEBUG_GRID_RANGE] = loc.slant_range_km as f32;
        }

        let el = loc.el_deg;
        let az = self.limits.condition_az(loc.az_deg);
        let (iel, iaz) = match (self.limits.el_index(el), self.limits.az_index(az)) {
            (Some(iel), Some(iaz)) => (iel, iaz),
            _ => return,
        };

        let mut points = Quadrant::ALL.map(|quadrant| self.bounding_point(quadrant, iel, iaz, el, az));
        let mut n_avail = 0;
        for pt in points.iter_mut() {
            if pt.has_ray() {
                n_avail += 1;
                pt.interp_el = pt.ray_el;
                pt.interp_az = pt.ray_az;
            } else {
                pt.interp_el = el;
                pt.interp_az = az;
            }
        }

        if self.output_debug_fields {
            for quadrant in Quadrant::ALL {
                let pt = &points[quadrant.index()];
                if pt.has_ray() {
                    let offset = n_fields + debug_quadrant_offset(quadrant);
                    out[offset] = pt.ray_el as f32;
                    out[offset + 1] = pt.ray_az as f32;
                }
            }
        }

        if n_avail < 2 {
            return;
        }
        if n_avail == 2 && !self.within_data_edge(&points, el, az) {
            return;
        }

        let range = RangeWeights::compute(
            loc.slant_range_km,
            self.gate_geom.start_range_km,
            self.gate_geom.gate_spacing_km,
        );
        let mut wts = if n_avail == 2 {
            Neighbors::for_two_rays(el, az, &points, &range)
        } else {
            if n_avail == 3 {
                fill_missing_corner(&mut points);
            }
            Neighbors::for_three_or_four_rays(el, az, &points, &range)
        };
        wts.normalize();

        let mut max_contrib = 0;
        for (ifield, kind) in self.kinds.iter().enumerate() {
            let (val, n_contrib) = match kind {
                FieldKind::Discrete => {
                    self.accumulate(Nearest::default(), ifield, &points, &wts, &range)
                }
                FieldKind::Folded(limits) => {
                    self.accumulate(Folded::new(*limits), ifield, &points, &wts, &range)
                }
                FieldKind::Continuous => {
                    let (val, n_contrib) =
                        self.accumulate(WeightedMean::default(), ifield, &points, &wts, &range);
                    (val.map(|v| self.fields[ifield].apply_bounds(v)), n_contrib)
                }
            };
            if let Some(val) = val {
                out[ifield] = val as f32;
            }
            max_contrib = max_contrib.max(n_contrib);
        }

        if self.output_debug_fields {
            out[n_fields + DEBUG_N_CONTRIB] = max_contrib as f32;
        }
    }

    /// Looks up the quadrant's ray and, because matrix cells have finite
    /// size, shifts the lookup by up to one cell per axis (twice) when the
    /// ray lies on the wrong side of the query angles.
    fn bounding_point(&self, quadrant: Quadrant, iel: usize, iaz: usize, el: f64, az: f64) -> SearchPoint {
        let lookup = |jel: usize, jaz: usize| {
            self.matrix
                .point(quadrant, jel, jaz)
                .copied()
                .unwrap_or_default()
        };
        let mut pt = lookup(iel, iaz);
        if !pt.has_ray() {
            return pt;
        }
        let (mut jel, mut jaz) = (iel, iaz);
        let n_el = self.limits.n_el;
        let n_az = self.limits.n_az;
        for _ in 0..2 {
            let shift_el = if quadrant.is_lower() {
                pt.ray_el > el && jel > 0
            } else {
                pt.ray_el < el && jel + 1 < n_el
            };
            if shift_el {
                jel = if quadrant.is_lower() { jel - 1 } else { jel + 1 };
                pt = lookup(jel, jaz);
                if !pt.has_ray() {
                    break;
                }
            }
            let shift_az = if quadrant.is_left() {
                pt.ray_az > az && jaz > 0
            } else {
                pt.ray_az < az && jaz + 1 < n_az
            };
            if shift_az {
                jaz = if quadrant.is_left() { jaz - 1 } else { jaz + 1 };
                pt = lookup(jel, jaz);
                if !pt.has_ray() {
                    break;
                }
            }
        }
        pt
    }

    /// With only two rays the cell may lie past the edge of the measured
    /// data; allow it only within a fraction of the beam width.
    fn within_data_edge(&self, points: &[SearchPoint; 4], el: f64, az: f64) -> bool {
        let ray = |quadrant: Quadrant| points[quadrant.index()].ray.and_then(|iray| self.rays.get(iray));
        let az_error = |a: &InterpRay, b: &InterpRay| {
            (az - self.limits.condition_az(a.az_for_limits))
                .abs()
                .min((az - self.limits.condition_az(b.az_for_limits)).abs())
        };
        let el_error = |a: &InterpRay, b: &InterpRay| {
            (el - a.el_for_limits).abs().min((el - b.el_for_limits).abs())
        };
        let ll = ray(Quadrant::LowerLeft);
        let ul = ray(Quadrant::UpperLeft);
        let lr = ray(Quadrant::LowerRight);
        let ur = ray(Quadrant::UpperRight);
        let (angle_error, beam_width) = match (ll, ul, lr, ur) {
            (Some(ll), Some(ul), _, _) => (az_error(ll, ul), self.beam_width_h_deg),
            (_, _, Some(lr), Some(ur)) => (az_error(lr, ur), self.beam_width_h_deg),
            (Some(ll), _, Some(lr), _) => (el_error(ll, lr), self.beam_width_v_deg),
            (_, Some(ul), _, Some(ur)) => (el_error(ul, ur), self.beam_width_v_deg),
            _ => (0.0, 1.0),
        };
        angle_error <= beam_width * self.beam_width_fraction
    }

    fn accumulate<A: Accumulator>(
        &self,
        mut acc: A,
        ifield: usize,
        points: &[SearchPoint; 4],
        wts: &Neighbors,
        range: &RangeWeights,
    ) -> (Option<f64>, usize) {
        for quadrant in Quadrant::ALL {
            let ray = match points[quadrant.index()].ray.and_then(|iray| self.rays.get(iray)) {
                Some(ray) => ray,
                None => continue,
            };
            let wt = wts.get(quadrant);
            for (igate, gate_wt) in [(range.inner_gate, wt.inner), (range.outer_gate, wt.outer)] {
                if let Some(val) = ray.value(ifield, igate) {
                    acc.add(val as f64, gate_wt);
                }
            }
        }
        let n_contrib = acc.n_contrib();
        if n_contrib >= self.min_nvalid {
            (acc.value(), n_contrib)
        } else {
            (None, n_contrib)
        }
    }
}
