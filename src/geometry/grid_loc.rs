// polar-cartgrid/src/geometry/grid_loc.rs

use super::beam_height::BeamHeight;
use super::projection::{latlon_to_r_theta, Projection};
use crate::params::{GridOrigin, InterpParams};
use crate::scheduler::TaskScheduler;
use crate::volume::RadarSite;
use libm::{cos, sin};
use log::{debug, info};
use ndarray::Array3;
use std::time::Instant;

const SITE_MOVED_EPSILON: f64 = 1.0e-5;

/// Position of one grid cell relative to the instrument.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GridLoc {
    pub el_deg: f64,
    pub az_deg: f64,
    pub slant_range_km: f64,
    pub gnd_range_km: f64,
    pub xx_instr: f64,
    pub yy_instr: f64,
    pub zz_instr: f64,
}

/// Per-cell [`GridLoc`] values indexed `[iz, iy, ix]`, kept across volumes
/// until the instrument moves.
#[derive(Debug, Default)]
pub struct GridLocCache {
    locs: Array3<GridLoc>,
    site: Option<(f64, f64, f64)>,
}

impl GridLocCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locs(&self) -> &Array3<GridLoc> {
        &self.locs
    }

    pub fn invalidate(&mut self) {
        self.site = None;
    }

    pub fn is_current(&self, site: &RadarSite) -> bool {
        match self.site {
            Some((lat, lon, alt)) => {
                (lat - site.latitude_deg).abs() <= SITE_MOVED_EPSILON
                    && (lon - site.longitude_deg).abs() <= SITE_MOVED_EPSILON
                    && (alt - site.altitude_km).abs() <= SITE_MOVED_EPSILON
            }
            None => false,
        }
    }

    /// Recomputes the cache if the site moved. Returns whether it did.
    pub fn update(
        &mut self,
        site: &RadarSite,
        params: &InterpParams,
        scheduler: &TaskScheduler,
    ) -> bool {
        if self.is_current(site) {
            debug!("grid locations unchanged, reusing cache");
            return false;
        }
        let now = Instant::now();
        let grid = params.grid_geometry();
        let (origin_lat, origin_lon) = match params.origin {
            GridOrigin::RadarCentered => (site.latitude_deg, site.longitude_deg),
            GridOrigin::Fixed { lat, lon } => (lat, lon),
        };
        let projection = Projection::new(params.projection, origin_lat, origin_lon);
        let beam = BeamHeight::new(site.altitude_km, params.pseudo_earth_radius_ratio);

        let mut locs = Array3::<GridLoc>::default(grid.shape());
        scheduler.for_each_row(locs.view_mut(), |iz, iy, mut row| {
            let zz = grid.z_levels[iz];
            let yy = grid.y_at(iy);
            for (ix, loc) in row.iter_mut().enumerate() {
                let xx = grid.x_at(ix);
                let (lat, lon) = projection.xy_to_latlon(xx, yy);
                let (gnd_range_km, mut az_deg) =
                    latlon_to_r_theta(site.latitude_deg, site.longitude_deg, lat, lon);
                if az_deg < 0.0 {
                    az_deg += 360.0;
                }
                let beam_geom = beam.compute_elevation(zz, gnd_range_km);
                let az_rad = az_deg.to_radians();
                *loc = GridLoc {
                    el_deg: beam_geom.elevation_deg,
                    az_deg,
                    slant_range_km: beam_geom.slant_range_km,
                    gnd_range_km,
                    xx_instr: gnd_range_km * sin(az_rad),
                    yy_instr: gnd_range_km * cos(az_rad),
                    zz_instr: zz - site.altitude_km,
                };
            }
        });
        self.locs = locs;
        self.site = Some((site.latitude_deg, site.longitude_deg, site.altitude_km));
        info!(
            "computed {} grid locations in {}",
            grid.n_points(),
            humantime::format_duration(now.elapsed())
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{GridXyGeom, InterpParamsBuilder, ZLevels};

    fn params() -> InterpParams {
        InterpParamsBuilder::default()
            .grid_xy(GridXyGeom {
                nx: 5,
                ny: 5,
                minx: -20.0,
                miny: -20.0,
                dx: 10.0,
                dy: 10.0,
            })
            .z_levels(ZLevels::Explicit(vec![1.0, 2.0]))
            .build()
            .unwrap()
    }

    fn site() -> RadarSite {
        RadarSite {
            latitude_deg: 35.0,
            longitude_deg: -97.0,
            altitude_km: 0.3,
            ..RadarSite::default()
        }
    }

    #[test]
    fn test_grid_locations() {
        let params = params();
        let scheduler = TaskScheduler::new(2).unwrap();
        let mut cache = GridLocCache::new();
        assert!(cache.update(&site(), &params, &scheduler));
        let locs = cache.locs();
        assert_eq!(locs.shape(), &[2, 5, 5]);

        // due east of the radar
        let east = locs[[0, 2, 4]];
        assert!((east.az_deg - 90.0).abs() < 1e-6);
        assert!((east.gnd_range_km - 20.0).abs() < 1e-6);
        assert!((east.xx_instr - 20.0).abs() < 1e-6);
        assert!(east.yy_instr.abs() < 1e-6);
        assert!((east.zz_instr - 0.7).abs() < 1e-9);
        assert!(east.el_deg > 0.0);
        assert!(east.slant_range_km > 20.0);

        // due north
        let north = locs[[1, 4, 2]];
        assert!(north.az_deg.abs() < 1e-6 || (north.az_deg - 360.0).abs() < 1e-6);
        assert!(north.el_deg > east.el_deg);

        // west stays in [0, 360)
        let west = locs[[0, 2, 0]];
        assert!((west.az_deg - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_cache_reuse() {
        let params = params();
        let scheduler = TaskScheduler::new(1).unwrap();
        let mut cache = GridLocCache::new();
        assert!(cache.update(&site(), &params, &scheduler));
        assert!(!cache.update(&site(), &params, &scheduler));

        let mut nudged = site();
        nudged.latitude_deg += 1.0e-6;
        assert!(!cache.update(&nudged, &params, &scheduler));

        nudged.latitude_deg += 1.0e-3;
        assert!(cache.update(&nudged, &params, &scheduler));

        cache.invalidate();
        assert!(!cache.is_current(&nudged));
        assert!(cache.update(&nudged, &params, &scheduler));
    }

    #[test]
    fn test_thread_count_independent() {
        let params = params();
        let mut single = GridLocCache::new();
        single.update(&site(), &params, &TaskScheduler::new(1).unwrap());
        let mut multi = GridLocCache::new();
        multi.update(&site(), &params, &TaskScheduler::new(4).unwrap());
        assert_eq!(single.locs(), multi.locs());
    }
}
