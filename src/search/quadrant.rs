// polar-cartgrid/src/search/quadrant.rs

use super::limits::SearchLimits;
use super::point::{Quadrant, SearchPoint};
use log::trace;
use ndarray::Array2;

/// Search matrix of one quadrant, indexed `[iel, iaz]`. After propagation
/// each cell holds the nearest ray lying in the quadrant's direction.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadrantMatrix {
    quadrant: Quadrant,
    points: Array2<SearchPoint>,
}

impl QuadrantMatrix {
    pub fn new(quadrant: Quadrant, points: Array2<SearchPoint>) -> Self {
        Self { quadrant, points }
    }

    pub fn quadrant(&self) -> Quadrant {
        self.quadrant
    }

    pub fn points(&self) -> &Array2<SearchPoint> {
        &self.points
    }

    pub fn point(&self, iel: usize, iaz: usize) -> Option<&SearchPoint> {
        self.points.get([iel, iaz])
    }

    /// Seeded cells in propagation order. Rows and columns at the far edge
    /// in the propagation direction are left out since nothing lies beyond
    /// them.
    pub fn seed_frontier(&self) -> Vec<(usize, usize)> {
        let (n_el, n_az) = self.points.dim();
        let el_order = Self::ordered(n_el, self.quadrant.el_step());
        let az_order = Self::ordered(n_az, self.quadrant.az_step());
        let mut frontier = Vec::new();
        for &iel in el_order.iter() {
            for &iaz in az_order.iter() {
                if self.points[[iel, iaz]].has_ray() {
                    frontier.push((iel, iaz));
                }
            }
        }
        frontier
    }

    fn ordered(n: usize, step: i64) -> Vec<usize> {
        if step > 0 {
            (0..n.saturating_sub(1)).collect()
        } else {
            (1..n).rev().collect()
        }
    }

    /// Level-synchronous wavefront: level `L + 1` starts only once every
    /// write of level `L` is in place. Returns the number of levels that
    /// wrote at least one cell.
    pub fn propagate(&mut self, limits: &SearchLimits) -> u32 {
        let mut frontier = self.seed_frontier();
        let mut n_levels = 0;
        for level in 0..limits.max_count {
            let next = self.propagate_level(level, &frontier, limits);
            trace!(
                "{} level {}: {} cells written",
                self.quadrant.label(),
                level,
                next.len()
            );
            if next.is_empty() {
                break;
            }
            n_levels += 1;
            frontier = next;
        }
        n_levels
    }

    fn propagate_level(
        &mut self,
        level: u32,
        frontier: &[(usize, usize)],
        limits: &SearchLimits,
    ) -> Vec<(usize, usize)> {
        let (n_el, n_az) = self.points.dim();
        let el_step = self.quadrant.el_step();
        let az_step = self.quadrant.az_step();
        let mut next = Vec::new();
        for &(iel, iaz) in frontier {
            let jel = iel as i64 + el_step;
            let jaz = iaz as i64 + az_step;
            if jel < 0 || jel >= n_el as i64 || jaz < 0 || jaz >= n_az as i64 {
                continue;
            }
            let (jel, jaz) = (jel as usize, jaz as usize);
            let source = self.points[[iel, iaz]];
            if source.el_dist >= limits.max_dist_el || source.az_dist >= limits.max_dist_az {
                continue;
            }

            // along azimuth
            let target = &mut self.points[[iel, jaz]];
            if !target.has_ray() {
                *target = SearchPoint {
                    level: level + 1,
                    az_dist: source.az_dist + 1,
                    ..SearchPoint::seeded_from(&source)
                };
                next.push((iel, jaz));
            }

            // along elevation
            let target = &mut self.points[[jel, iaz]];
            if !target.has_ray() {
                *target = SearchPoint {
                    level: level + 1,
                    el_dist: source.el_dist + 1,
                    ..SearchPoint::seeded_from(&source)
                };
                next.push((jel, iaz));
            }
        }
        next
    }
}
