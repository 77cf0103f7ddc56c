// polar-cartgrid/src/search/matrix.rs

use super::limits::SearchLimits;
use super::point::{Quadrant, SearchPoint};
use super::quadrant::QuadrantMatrix;
use crate::scheduler::TaskScheduler;
use crate::volume::{AzimuthCoverage, InterpRay};
use crate::MISSING_FL32;
use log::{debug, info};
use ndarray::Array2;
use std::fmt::Write;
use std::time::Instant;

/// A named `[iel, iaz]` diagnostic plane of the search matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixField {
    pub name: String,
    pub data: Array2<f32>,
}

/// The four quadrant matrices over the same angular grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchMatrix {
    limits: SearchLimits,
    quadrants: Vec<QuadrantMatrix>,
    n_seeded: usize,
}

impl SearchMatrix {
    /// Seeds every ray into all four quadrants and propagates each quadrant
    /// on the scheduler.
    pub fn build(rays: &[InterpRay], limits: &SearchLimits, scheduler: &TaskScheduler) -> Self {
        let now = Instant::now();
        let (seeded, n_seeded) = Self::seed(rays, limits);
        let mut quadrants: Vec<QuadrantMatrix> = Quadrant::ALL
            .iter()
            .map(|quadrant| QuadrantMatrix::new(*quadrant, seeded.clone()))
            .collect();
        drop(seeded);
        scheduler.for_each_task(&mut quadrants, |matrix| {
            let n_levels = matrix.propagate(limits);
            debug!(
                "{} search matrix filled in {} levels",
                matrix.quadrant().label(),
                n_levels
            );
        });
        info!(
            "search matrix {} x {} from {} rays built in {}",
            limits.n_el,
            limits.n_az,
            n_seeded,
            humantime::format_duration(now.elapsed())
        );
        Self {
            limits: *limits,
            quadrants,
            n_seeded,
        }
    }

    fn seed(rays: &[InterpRay], limits: &SearchLimits) -> (Array2<SearchPoint>, usize) {
        let mut points = Array2::<SearchPoint>::default((limits.n_el, limits.n_az));
        let mut n_seeded = 0;
        for (iray, ray) in rays.iter().enumerate() {
            if ray.el < limits.min_el || ray.el > limits.max_el {
                continue;
            }
            let az = if limits.is_sector() {
                limits.condition_az(ray.az)
            } else {
                ray.az
            };
            let (iel, iaz) = match (limits.el_index(ray.el), limits.az_index(az)) {
                (Some(iel), Some(iaz)) => (iel, iaz),
                _ => continue,
            };
            points[[iel, iaz]] = SearchPoint::seeded(iray, ray.el, az);
            n_seeded += 1;
        }

        // full circle: repeat the low azimuths past 360 so lookups can cross
        // north without wrapping
        if limits.coverage == AzimuthCoverage::Full360 {
            let band = (
                limits.az_index(0.0),
                limits.az_index(limits.overlap_deg),
                limits.az_index(360.0),
            );
            if let (Some(source_start), Some(source_end), Some(target_start)) = band {
                let offset = target_start - source_start;
                for iaz in source_start..=source_end {
                    let jaz = iaz + offset;
                    if jaz >= limits.n_az {
                        continue;
                    }
                    for iel in 0..limits.n_el {
                        let source = points[[iel, iaz]];
                        if source.has_ray() {
                            points[[iel, jaz]] = SearchPoint {
                                ray_az: source.ray_az + 360.0,
                                ..source
                            };
                        }
                    }
                }
            }
        }
        (points, n_seeded)
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    /// Rays that landed inside the search bounds.
    pub fn n_seeded(&self) -> usize {
        self.n_seeded
    }

    pub fn quadrant(&self, quadrant: Quadrant) -> &QuadrantMatrix {
        &self.quadrants[quadrant.index()]
    }

    pub fn point(&self, quadrant: Quadrant, iel: usize, iaz: usize) -> Option<&SearchPoint> {
        self.quadrant(quadrant).point(iel, iaz)
    }

    /// Ray elevation, azimuth and sweep number planes for every quadrant.
    pub fn debug_fields(&self, rays: &[InterpRay]) -> Vec<MatrixField> {
        let mut fields = Vec::with_capacity(12);
        for quadrant in [
            Quadrant::LowerLeft,
            Quadrant::LowerRight,
            Quadrant::UpperLeft,
            Quadrant::UpperRight,
        ] {
            let points = self.quadrant(quadrant).points();
            let label = quadrant.label();
            let el = points.mapv(|pt| {
                if pt.has_ray() {
                    pt.ray_el as f32
                } else {
                    MISSING_FL32
                }
            });
            let az = points.mapv(|pt| {
                if pt.has_ray() {
                    pt.ray_az as f32
                } else {
                    MISSING_FL32
                }
            });
            let sweep = points.mapv(|pt| match pt.ray.and_then(|iray| rays.get(iray)) {
                Some(ray) => ray.sweep_index as f32,
                None => MISSING_FL32,
            });
            fields.push(MatrixField {
                name: format!("{}_El", label),
                data: el,
            });
            fields.push(MatrixField {
                name: format!("{}_Az", label),
                data: az,
            });
            fields.push(MatrixField {
                name: format!("{}_SwpNum", label),
                data: sweep,
            });
        }
        fields
    }

    /// One-line description of a matrix cell for trace logging.
    pub fn point_summary(&self, iel: usize, iaz: usize) -> String {
        let mut summary = String::new();
        let _ = write!(
            summary,
            "iel, iaz, el, az: {:4} {:4} {:7.3} {:7.3}",
            iel,
            iaz,
            self.limits.el_at(iel),
            self.limits.az_at(iaz)
        );
        for quadrant in Quadrant::ALL {
            match self.point(quadrant, iel, iaz) {
                Some(pt) if pt.has_ray() => {
                    let _ = write!(
                        summary,
                        " {} {:7.3} {:7.3}",
                        quadrant.label(),
                        pt.ray_el,
                        pt.ray_az
                    );
                }
                _ => {
                    let _ = write!(summary, " {} {:7.3} {:7.3}", quadrant.label(), -99.999, -99.999);
                }
            }
        }
        summary
    }
}
