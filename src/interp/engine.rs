// polar-cartgrid/src/interp/engine.rs

use super::cell::{CellInterpolator, DEBUG_FIELD_NAMES};
use super::errors::CartInterpError;
use super::output::{GridVolume, OutputField};
use crate::conv_strat::{ConvStratClassifier, ConvStratGrid};
use crate::geometry::GridLocCache;
use crate::params::{GridProjection, InterpParams};
use crate::scheduler::TaskScheduler;
use crate::search::{ScanSummary, SearchLimits, SearchMatrix};
use crate::volume::{FoldLimits, InterpField, InterpRay, RayVolume};
use crate::MISSING_FL32;
use log::{debug, info, log_enabled, trace, warn, Level};
use ndarray::{Array4, Axis};
use std::time::Instant;

/// Interpolates polar volumes onto the configured Cartesian grid. Grid
/// locations are kept between volumes while the radar stays put.
pub struct CartInterp {
    params: InterpParams,
    scheduler: TaskScheduler,
    grid_loc: GridLocCache,
    classifier: Option<Box<dyn ConvStratClassifier>>,
}

impl CartInterp {
    pub fn params(&self) -> &InterpParams {
        &self.params
    }

    pub fn n_threads(&self) -> usize {
        self.scheduler.n_threads()
    }

    pub fn grid_loc_cache(&self) -> &GridLocCache {
        &self.grid_loc
    }

    /// Forces grid locations to be recomputed on the next volume.
    pub fn invalidate_grid_cache(&mut self) {
        self.grid_loc.invalidate();
    }

    pub fn classifier_mut(&mut self) -> Option<&mut (dyn ConvStratClassifier + 'static)> {
        self.classifier.as_deref_mut()
    }

    /// Runs the whole volume: field resolution, search matrix and grid
    /// locations (concurrently), cell interpolation and the classifier.
    /// An empty `fields` slice interpolates every field found on the rays.
    pub fn interp_vol(
        &mut self,
        volume: &RayVolume,
        fields: &[InterpField],
    ) -> Result<GridVolume, CartInterpError> {
        let now = Instant::now();
        if volume.is_empty() {
            return Err(CartInterpError::NoData("volume has no rays".to_string()));
        }
        info!("interpolating volume with {} rays", volume.len());

        let requested = if fields.is_empty() {
            volume.default_fields()
        } else {
            fields.to_vec()
        };
        let (fields, missing_fields) = self.resolve_fields(volume, requested);

        let gate_geom = volume
            .predominant_gate_geometry()
            .ok_or_else(|| CartInterpError::NoData("rays carry no gates".to_string()))?;
        let (min_el_deg, max_el_deg) = volume.elevation_extent()?;
        let site = volume.site();
        let scan = ScanSummary {
            min_el_deg,
            max_el_deg,
            delta_el_deg: volume.elevation_delta(),
            delta_az_deg: volume.azimuth_delta(),
            beam_width_h_deg: self.params.beam_width_deg_h.unwrap_or(site.beam_width_h_deg),
            beam_width_v_deg: self.params.beam_width_deg_v.unwrap_or(site.beam_width_v_deg),
        };
        debug!("scan summary: {:?}", scan);
        let coverage = volume
            .locate_data_sector(scan.search_radius_az())
            .ok_or_else(|| CartInterpError::NoData("no azimuth coverage".to_string()))?;
        let limits = SearchLimits::compute(&self.params, &scan, coverage);

        let rays: Vec<InterpRay> = volume
            .rays()
            .iter()
            .map(|ray| InterpRay::new(ray, &fields))
            .collect();

        let params = &self.params;
        let scheduler = &self.scheduler;
        let grid_loc = &mut self.grid_loc;
        let (matrix, _) = scheduler.join(
            || SearchMatrix::build(&rays, &limits, scheduler),
            || grid_loc.update(site, params, scheduler),
        );
        if matrix.n_seeded() == 0 {
            return Err(CartInterpError::NoData(
                "no rays fall inside the search limits".to_string(),
            ));
        }
        if log_enabled!(Level::Trace) {
            trace!(
                "centre search cell: {}",
                matrix.point_summary(limits.n_el / 2, limits.n_az / 2)
            );
        }

        let interp = CellInterpolator {
            limits: &limits,
            matrix: &matrix,
            rays: &rays,
            fields: &fields,
            kinds: fields
                .iter()
                .map(|field| field.kind(params.use_nearest_neighbor))
                .collect(),
            gate_geom,
            beam_width_h_deg: scan.beam_width_h_deg,
            beam_width_v_deg: scan.beam_width_v_deg,
            beam_width_fraction: params.beam_width_fraction_for_data_limit_extension,
            min_nvalid: params.min_nvalid_for_interp,
            output_debug_fields: params.output_debug_fields,
        };

        let grid = params.grid_geometry();
        let (nz, ny, nx) = grid.shape();
        let mut buf = Array4::<f32>::from_elem((nz, ny, nx, interp.n_channels()), MISSING_FL32);
        let locs = self.grid_loc.locs();
        let interp_start = Instant::now();
        scheduler.for_each_row(buf.view_mut(), |iz, iy, mut row| {
            for (ix, cell) in row.outer_iter_mut().enumerate() {
                interp.interp_cell(&locs[[iz, iy, ix]], cell);
            }
        });
        debug!(
            "interpolated {} cells in {}",
            grid.n_points(),
            humantime::format_duration(interp_start.elapsed())
        );

        let out_fields: Vec<OutputField> = fields
            .iter()
            .enumerate()
            .map(|(ich, field)| OutputField {
                name: field.output_name.clone(),
                long_name: field.long_name.clone(),
                units: field.units.clone(),
                scale: field.scale,
                offset: field.offset,
                data: buf.index_axis(Axis(3), ich).to_owned(),
            })
            .collect();
        let debug_fields: Vec<OutputField> = if params.output_debug_fields {
            DEBUG_FIELD_NAMES
                .iter()
                .enumerate()
                .map(|(i, name)| OutputField {
                    name: name.to_string(),
                    long_name: String::new(),
                    units: String::new(),
                    scale: 1.0,
                    offset: 0.0,
                    data: buf.index_axis(Axis(3), fields.len() + i).to_owned(),
                })
                .collect()
        } else {
            Vec::new()
        };
        let search_matrix_fields = if params.write_search_matrix_fields {
            matrix.debug_fields(&rays)
        } else {
            Vec::new()
        };

        let mut grid_vol = GridVolume {
            grid,
            fields: out_fields,
            debug_fields,
            search_matrix_fields,
            missing_fields,
            conv_strat_computed: false,
        };
        grid_vol.conv_strat_computed = self.run_classifier(&grid_vol);
        for field in grid_vol.fields.iter() {
            debug!("{}: {} valid cells", field.name, field.n_valid());
        }
        info!(
            "volume interpolated onto {} x {} x {} grid in {}",
            nx,
            ny,
            nz,
            humantime::format_duration(now.elapsed())
        );
        Ok(grid_vol)
    }

    /// Applies the params' field overrides and drops fields no ray carries.
    fn resolve_fields(
        &self,
        volume: &RayVolume,
        requested: Vec<InterpField>,
    ) -> (Vec<InterpField>, Vec<String>) {
        let mut fields = Vec::with_capacity(requested.len());
        let mut missing = Vec::new();
        for mut field in requested {
            if !volume.rays().iter().any(|ray| ray.field(&field.name).is_some()) {
                warn!("field {} not found on any ray, skipping", field.name);
                missing.push(field.name);
                continue;
            }
            if self.params.discrete_fields.iter().any(|name| *name == field.name) {
                field.is_discrete = true;
            }
            if let Some(folded) = self
                .params
                .folded_fields
                .iter()
                .find(|folded| folded.name == field.name)
            {
                match folded.limits {
                    Some((lower, upper)) => field.folds = Some(FoldLimits::new(lower, upper)),
                    None => match volume.nyquist_fold_limits() {
                        Some(limits) => field.folds = Some(limits),
                        None => warn!(
                            "field {} folds on nyquist but the volume has none, treating as unfolded",
                            field.name
                        ),
                    },
                }
            }
            if let Some(bounded) = self
                .params
                .bounded_fields
                .iter()
                .find(|bounded| bounded.name == field.name)
            {
                field.bounds = Some((bounded.min, bounded.max));
            }
            if let Some(renamed) = self
                .params
                .renamed_fields
                .iter()
                .find(|renamed| renamed.name == field.name)
            {
                field.output_name = renamed.output_name.clone();
            }
            debug!(
                "field {} -> {} as {:?}",
                field.name,
                field.output_name,
                field.kind(self.params.use_nearest_neighbor)
            );
            fields.push(field);
        }
        (fields, missing)
    }

    /// Hands the configured field to the classifier. Returns whether the
    /// partition was computed.
    fn run_classifier(&mut self, grid_vol: &GridVolume) -> bool {
        let (classifier, field_name) =
            match (self.classifier.as_mut(), self.params.conv_strat_field_name.as_ref()) {
                (Some(classifier), Some(field_name)) => (classifier, field_name),
                _ => return false,
            };
        let field = match grid_vol
            .fields
            .iter()
            .find(|field| &field.name == field_name)
        {
            Some(field) => field,
            None => {
                warn!("conv/strat field {} not in output, skipping partition", field_name);
                return false;
            }
        };
        let grid = &grid_vol.grid;
        let conv_grid = ConvStratGrid {
            nx: grid.nx,
            ny: grid.ny,
            dx: grid.dx,
            dy: grid.dy,
            minx: grid.minx,
            miny: grid.miny,
            z_levels: &grid.z_levels,
            is_lat_lon: grid.projection == GridProjection::LatLon,
        };
        match classifier.compute_partition(field.data.view(), MISSING_FL32, &conv_grid) {
            Ok(()) => {
                debug!("conv/strat partition computed on {}", field_name);
                true
            }
            Err(err) => {
                warn!("conv/strat partition failed: {:#}", err);
                false
            }
        }
    }
}

#[derive(Default)]
pub struct CartInterpBuilder<'a> {
    params: Option<&'a InterpParams>,
    classifier: Option<Box<dyn ConvStratClassifier>>,
}

impl<'a> CartInterpBuilder<'a> {
    pub fn build(&mut self) -> Result<CartInterp, CartInterpError> {
        let params = self
            .params
            .ok_or_else(|| CartInterpError::UninitializedFieldError("params".to_string()))?;
        params.validate()?;
        let scheduler = TaskScheduler::from_params(params)?;
        info!(
            "cartesian interpolator ready: {} threads, grid {} x {} x {}",
            scheduler.n_threads(),
            params.grid_xy.nx,
            params.grid_xy.ny,
            params.z_levels.levels().len()
        );
        Ok(CartInterp {
            params: params.clone(),
            scheduler,
            grid_loc: GridLocCache::new(),
            classifier: self.classifier.take(),
        })
    }

    pub fn params(&mut self, params: &'a InterpParams) -> &mut Self {
        self.params = Some(params);
        self
    }

    pub fn classifier(&mut self, classifier: Box<dyn ConvStratClassifier>) -> &mut Self {
        self.classifier = Some(classifier);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{
        BoundedFieldParams, FoldedFieldParams, GridXyGeom, InterpParamsBuilder, ParamsError,
        RenamedFieldParams, ZLevels,
    };
    use crate::geometry::BeamHeight;
    use crate::synthetic::SyntheticVolumeBuilder;
    use crate::volume::{PolarRay, RadarSite};
    use ndarray::{Array3, ArrayView3};
    use std::sync::{Arc, Mutex};

    // 30 x 30 km box north-east of the radar: azimuths roughly 27..63 deg
    fn sector_params() -> InterpParamsBuilder {
        let mut builder = InterpParamsBuilder::default();
        builder
            .grid_xy(GridXyGeom {
                nx: 7,
                ny: 7,
                minx: 20.0,
                miny: 20.0,
                dx: 3.0,
                dy: 3.0,
            })
            .z_levels(ZLevels::Uniform {
                nz: 3,
                minz: 0.5,
                dz: 0.5,
            })
            .n_compute_threads(1);
        builder
    }

    fn sector_volume() -> RayVolume {
        let elevations = [0.5, 1.5, 2.5, 3.5];
        SyntheticVolumeBuilder::default()
            .elevations(&elevations)
            .azimuths(15.0, 1.0, 61)
            .gates(0.0, 0.5, 160)
            .nyquist(25.0)
            .field("DBZ", |az, el, range| {
                (10.0 + 0.3 * az + 4.0 * el + 0.1 * range) as f32
            })
            .field("VEL", |az, _, _| (((az * 1.7) % 50.0) - 25.0) as f32)
            .field("HCA", |az, el, _| ((az as i64 / 7 + el as i64) % 5) as f32)
            .build()
            .unwrap()
    }

    fn interp(params: &InterpParams) -> CartInterp {
        CartInterpBuilder::default().params(params).build().unwrap()
    }

    #[test]
    fn test_builder_requires_params() {
        let err = CartInterpBuilder::default().build().err().unwrap();
        assert!(matches!(err, CartInterpError::UninitializedFieldError(ref f) if f == "params"));
    }

    #[test]
    fn test_no_rays() {
        crate::_setup_pretty_env_logger_default();
        let params = sector_params().build().unwrap();
        let volume = RayVolume::new(RadarSite::default(), Vec::new());
        let err = interp(&params).interp_vol(&volume, &[]).unwrap_err();
        assert!(matches!(err, CartInterpError::NoData(_)));
    }

    #[test]
    fn test_rejects_params_edited_after_build() {
        let mut params = sector_params().build().unwrap();
        params.search_res_az = 0.0;
        let err = CartInterpBuilder::default().params(&params).build().err().unwrap();
        assert!(matches!(
            err,
            CartInterpError::Params(ParamsError::NotPositive(ref name, _)) if name == "search_res_az"
        ));
    }

    #[test]
    fn test_single_ray_never_brackets() {
        let params = sector_params().build().unwrap();
        // off the grid diagonal; a ray sharing a cell's azimuth exactly
        // counts as both left and right of it
        let mut ray = PolarRay::new(31.7, 1.0, 0, 0.0, 1.0);
        ray.add_field("DBZ", vec![10.0; 50]);
        let volume = RayVolume::new(RadarSite::default(), vec![ray]);
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        assert_eq!(grid_vol.field("DBZ").unwrap().n_valid(), 0);
    }

    #[test]
    fn test_uniform_field_at_ray_position() {
        let elevations = [4.0, 5.0, 6.0];
        let volume = SyntheticVolumeBuilder::default()
            .elevations(&elevations)
            .azimuths(5.0, 1.0, 11)
            .gates(0.0, 0.25, 400)
            .field("DBZ", |_, _, _| 20.0)
            .build()
            .unwrap();
        // (x, y) = 20 * (sin 10, cos 10); z chosen for a 5 deg beam
        let gnd = 20.0;
        let x = gnd * 10.0_f64.to_radians().sin();
        let y = gnd * 10.0_f64.to_radians().cos();
        let z = BeamHeight::new(0.0, None).compute_ht_km(5.0, gnd / 5.0_f64.to_radians().cos());
        let params = InterpParamsBuilder::default()
            .grid_xy(GridXyGeom {
                nx: 1,
                ny: 1,
                minx: x,
                miny: y,
                dx: 1.0,
                dy: 1.0,
            })
            .z_levels(ZLevels::Explicit(vec![z]))
            .output_debug_fields(true)
            .build()
            .unwrap();
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let grid_az = grid_vol.debug_field("gridAz").unwrap().data[[0, 0, 0]];
        let grid_el = grid_vol.debug_field("gridEl").unwrap().data[[0, 0, 0]];
        assert!((grid_az - 10.0).abs() < 1.0e-3);
        assert!((grid_el - 5.0).abs() < 0.05);
        let dbz = grid_vol.field("DBZ").unwrap().data[[0, 0, 0]];
        assert!((dbz - 20.0).abs() < 1.0e-4);
        assert!(grid_vol.debug_field("nContrib").unwrap().data[[0, 0, 0]] >= 4.0);
    }

    fn one_cell_params(az_deg: f64, gnd_km: f64, z_km: f64) -> InterpParams {
        InterpParamsBuilder::default()
            .grid_xy(GridXyGeom {
                nx: 1,
                ny: 1,
                minx: gnd_km * az_deg.to_radians().sin(),
                miny: gnd_km * az_deg.to_radians().cos(),
                dx: 1.0,
                dy: 1.0,
            })
            .z_levels(ZLevels::Explicit(vec![z_km]))
            .n_compute_threads(1)
            .build()
            .unwrap()
    }

    fn uniform_ray(az: f64, el: f64, val: f32) -> PolarRay {
        let mut ray = PolarRay::new(az, el, 0, 0.0, 1.0);
        ray.add_field("DBZ", vec![val; 100]);
        ray
    }

    fn cell_height(el_deg: f64, gnd_km: f64) -> f64 {
        BeamHeight::new(0.0, None).compute_ht_km(el_deg, gnd_km / el_deg.to_radians().cos())
    }

    #[test]
    fn test_boundary_correction_shifts_lookup() {
        // the ray at 10.04 shares the cell's search column but lies to its
        // right, so the left quadrants must step back to the ray at 9.8
        let volume = RayVolume::new(
            RadarSite::default(),
            vec![
                uniform_ray(9.8, 1.0, 10.0),
                uniform_ray(10.04, 1.0, 30.0),
                uniform_ray(9.8, 2.0, 10.0),
                uniform_ray(10.04, 2.0, 30.0),
            ],
        );
        let gnd = 40.0;
        let mut params = one_cell_params(10.03, gnd, cell_height(1.5, gnd));
        params.output_debug_fields = true;
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let at = |name: &str| grid_vol.debug_field(name).unwrap().data[[0, 0, 0]];
        assert!((at("gridAz") - 10.03).abs() < 1.0e-4);
        assert!((at("llAz") - 9.8).abs() < 1.0e-4);
        assert!((at("ulAz") - 9.8).abs() < 1.0e-4);
        assert!((at("lrAz") - 10.04).abs() < 1.0e-4);
        assert!((at("urAz") - 10.04).abs() < 1.0e-4);
        let dbz = grid_vol.field("DBZ").unwrap().data[[0, 0, 0]];
        assert!(dbz > 10.0 && dbz < 30.0);
    }

    #[test]
    fn test_two_ray_edge_guard() {
        // both rays lie left of every query cell
        let volume = RayVolume::new(
            RadarSite::default(),
            vec![uniform_ray(10.0, 1.0, 20.0), uniform_ray(10.0, 2.0, 20.0)],
        );
        let gnd = 40.0;
        let z = cell_height(1.5, gnd);

        // 0.2 deg past the data, inside half a beam width
        let params = one_cell_params(10.2, gnd, z);
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let dbz = grid_vol.field("DBZ").unwrap().data[[0, 0, 0]];
        assert!((dbz - 20.0).abs() < 0.01, "got {}", dbz);

        // 2 deg past the data
        let params = one_cell_params(12.0, gnd, z);
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        assert_eq!(grid_vol.field("DBZ").unwrap().data[[0, 0, 0]], MISSING_FL32);
    }

    #[test]
    fn test_min_contributors_threshold() {
        let volume = RayVolume::new(
            RadarSite::default(),
            vec![
                uniform_ray(10.0, 1.0, 20.0),
                uniform_ray(12.0, 1.0, 20.0),
                uniform_ray(10.0, 2.0, 20.0),
                uniform_ray(12.0, 2.0, 20.0),
            ],
        );
        let gnd = 40.0;
        let mut params = one_cell_params(11.0, gnd, cell_height(1.5, gnd));
        // four rays, inner and outer gate each
        params.min_nvalid_for_interp = 8;
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        assert!((grid_vol.field("DBZ").unwrap().data[[0, 0, 0]] - 20.0).abs() < 1.0e-4);

        params.min_nvalid_for_interp = 9;
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        assert_eq!(grid_vol.field("DBZ").unwrap().data[[0, 0, 0]], MISSING_FL32);
    }

    #[test]
    fn test_midway_between_two_rays() {
        let mut left = PolarRay::new(10.0, 1.0, 0, 0.0, 1.0);
        left.add_field("DBZ", vec![10.0; 100]);
        let mut right = PolarRay::new(12.0, 1.0, 0, 0.0, 1.0);
        right.add_field("DBZ", vec![30.0; 100]);
        let volume = RayVolume::new(RadarSite::default(), vec![left, right]);
        let gnd = 40.0;
        let z = BeamHeight::new(0.0, None).compute_ht_km(1.0, gnd / 1.0_f64.to_radians().cos());
        let params = one_cell_params(11.0, gnd, z);
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let dbz = grid_vol.field("DBZ").unwrap().data[[0, 0, 0]];
        assert!((dbz - 20.0).abs() < 0.01, "got {}", dbz);
    }

    #[test]
    fn test_resolves_across_north() {
        let elevations = [0.5, 1.5];
        let volume = SyntheticVolumeBuilder::default()
            .elevations(&elevations)
            .azimuths(1.0, 2.0, 180)
            .gates(0.0, 0.5, 200)
            .field("DBZ", |az, _, _| if az > 180.0 { 40.0 } else { 20.0 })
            .build()
            .unwrap();
        assert!(volume.rays().iter().any(|ray| ray.azimuth == 359.0));
        let gnd = 30.0;
        let z = BeamHeight::new(0.0, None).compute_ht_km(1.0, gnd / 1.0_f64.to_radians().cos());
        let params = InterpParamsBuilder::default()
            .grid_xy(GridXyGeom {
                nx: 1,
                ny: 1,
                minx: 0.0,
                miny: gnd,
                dx: 1.0,
                dy: 1.0,
            })
            .z_levels(ZLevels::Explicit(vec![z]))
            .n_compute_threads(1)
            .build()
            .unwrap();
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let dbz = grid_vol.field("DBZ").unwrap().data[[0, 0, 0]];
        assert!(dbz != MISSING_FL32);
        assert!((dbz - 30.0).abs() < 0.5, "got {}", dbz);
    }

    #[test]
    fn test_thread_count_independent() {
        let volume = sector_volume();
        let single = sector_params()
            .use_multiple_threads(false)
            .output_debug_fields(true)
            .build()
            .unwrap();
        let multi = sector_params()
            .n_compute_threads(4)
            .output_debug_fields(true)
            .build()
            .unwrap();
        let a = interp(&single).interp_vol(&volume, &[]).unwrap();
        let mut engine = interp(&multi);
        assert_eq!(engine.n_threads(), 4);
        let b = engine.interp_vol(&volume, &[]).unwrap();
        assert!(a.field("DBZ").unwrap().n_valid() > 0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_continuous_output_within_contributing_range() {
        let volume = sector_volume();
        let params = sector_params().build().unwrap();
        let grid_vol = interp(&params)
            .interp_vol(&volume, &[InterpField::new("DBZ")])
            .unwrap();
        let dbz = grid_vol.field("DBZ").unwrap();
        assert!(dbz.n_valid() > dbz.data.len() / 2);
        let (min, max) = dbz.valid_range().unwrap();
        let input_min = volume
            .rays()
            .iter()
            .flat_map(|ray| ray.field("DBZ").unwrap().iter().copied())
            .fold(f32::MAX, f32::min);
        let input_max = volume
            .rays()
            .iter()
            .flat_map(|ray| ray.field("DBZ").unwrap().iter().copied())
            .fold(f32::MIN, f32::max);
        assert!(min >= input_min && max <= input_max);
    }

    #[test]
    fn test_discrete_field_never_blended() {
        let volume = sector_volume();
        let params = sector_params()
            .discrete_fields(vec!["HCA".to_string()])
            .build()
            .unwrap();
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let hca = grid_vol.field("HCA").unwrap();
        assert!(hca.n_valid() > 0);
        let inputs: Vec<f32> = volume
            .rays()
            .iter()
            .flat_map(|ray| ray.field("HCA").unwrap().iter().copied())
            .collect();
        for val in hca.data.iter().filter(|&&v| v != MISSING_FL32) {
            assert!(inputs.contains(val));
        }
    }

    #[test]
    fn test_discrete_two_rays_pick_one_value() {
        let volume = RayVolume::new(
            RadarSite::default(),
            vec![uniform_ray(10.0, 1.0, 0.0), uniform_ray(12.0, 1.0, 2.0)],
        );
        let gnd = 40.0;
        let z = BeamHeight::new(0.0, None).compute_ht_km(1.0, gnd / 1.0_f64.to_radians().cos());
        let mut params = one_cell_params(11.2, gnd, z);
        params.discrete_fields = vec!["DBZ".to_string()];
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let val = grid_vol.field("DBZ").unwrap().data[[0, 0, 0]];
        // a blend would land strictly between the two
        assert_eq!(val, 2.0);
    }

    #[test]
    fn test_nearest_neighbor_mode() {
        let volume = sector_volume();
        let params = sector_params().use_nearest_neighbor(true).build().unwrap();
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let inputs: Vec<f32> = volume
            .rays()
            .iter()
            .flat_map(|ray| ray.field("DBZ").unwrap().iter().copied())
            .collect();
        let dbz = grid_vol.field("DBZ").unwrap();
        assert!(dbz.n_valid() > 0);
        for val in dbz.data.iter().filter(|&&v| v != MISSING_FL32) {
            assert!(inputs.contains(val));
        }
    }

    #[test]
    fn test_folded_field_straddling_limit() {
        let mut left = PolarRay::new(10.0, 1.0, 0, 0.0, 1.0);
        left.add_field("VEL", vec![24.0; 100]).nyquist(25.0);
        let mut right = PolarRay::new(12.0, 1.0, 0, 0.0, 1.0);
        right.add_field("VEL", vec![-24.0; 100]).nyquist(25.0);
        let volume = RayVolume::new(RadarSite::default(), vec![left, right]);
        let gnd = 40.0;
        let z = BeamHeight::new(0.0, None).compute_ht_km(1.0, gnd / 1.0_f64.to_radians().cos());
        let mut params = one_cell_params(11.0, gnd, z);
        params.folded_fields = vec![FoldedFieldParams {
            name: "VEL".to_string(),
            limits: None,
        }];
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let vel = grid_vol.field("VEL").unwrap().data[[0, 0, 0]];
        // circular mean of +24 and -24 in [-25, 25) is the fold limit
        assert!(vel.abs() > 24.0, "got {}", vel);

        params.folded_fields.clear();
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        let vel = grid_vol.field("VEL").unwrap().data[[0, 0, 0]];
        assert!(vel.abs() < 0.01);
    }

    #[test]
    fn test_bounds_and_renames() {
        let volume = sector_volume();
        let params = sector_params()
            .bounded_fields(vec![BoundedFieldParams {
                name: "DBZ".to_string(),
                min: 0.0,
                max: 30.0,
            }])
            .renamed_fields(vec![RenamedFieldParams {
                name: "DBZ".to_string(),
                output_name: "REF".to_string(),
            }])
            .build()
            .unwrap();
        let grid_vol = interp(&params)
            .interp_vol(&volume, &[InterpField::new("DBZ").scaled(0.5, -32.0)])
            .unwrap();
        assert!(grid_vol.field("DBZ").is_none());
        let refl = grid_vol.field("REF").unwrap();
        let (_, max) = refl.valid_range().unwrap();
        assert!(max <= 30.0);
        assert_eq!((refl.scale, refl.offset), (0.5, -32.0));
    }

    #[test]
    fn test_missing_field_reported() {
        let volume = sector_volume();
        let params = sector_params().build().unwrap();
        let grid_vol = interp(&params)
            .interp_vol(&volume, &[InterpField::new("DBZ"), InterpField::new("ZDR")])
            .unwrap();
        assert_eq!(grid_vol.fields.len(), 1);
        assert_eq!(grid_vol.missing_fields, vec!["ZDR".to_string()]);
    }

    #[test]
    fn test_debug_and_search_matrix_fields() {
        let volume = sector_volume();
        let params = sector_params()
            .output_debug_fields(true)
            .write_search_matrix_fields(true)
            .build()
            .unwrap();
        let grid_vol = interp(&params).interp_vol(&volume, &[]).unwrap();
        assert_eq!(grid_vol.debug_fields.len(), DEBUG_FIELD_NAMES.len());
        assert_eq!(grid_vol.search_matrix_fields.len(), 12);
        let n_contrib = grid_vol.debug_field("nContrib").unwrap();
        let dbz = grid_vol.field("DBZ").unwrap();
        for (val, n) in dbz.data.iter().zip(n_contrib.data.iter()) {
            if *val != MISSING_FL32 {
                assert!(*n >= 1.0);
            }
        }
        let range = grid_vol.debug_field("gridRange").unwrap();
        assert!(range.data.iter().all(|&r| r > 28.0 && r < 60.0));
    }

    #[test]
    fn test_grid_cache_reused_across_volumes() {
        let volume = sector_volume();
        let params = sector_params().build().unwrap();
        let mut engine = interp(&params);
        let a = engine.interp_vol(&volume, &[]).unwrap();
        assert!(engine.grid_loc_cache().is_current(volume.site()));
        let b = engine.interp_vol(&volume, &[]).unwrap();
        engine.invalidate_grid_cache();
        assert!(!engine.grid_loc_cache().is_current(volume.site()));
        let c = engine.interp_vol(&volume, &[]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    struct Recorder {
        seen: Arc<Mutex<Option<(Array3<f32>, usize, Vec<f64>)>>>,
    }

    impl ConvStratClassifier for Recorder {
        fn compute_partition(
            &mut self,
            dbz: ArrayView3<'_, f32>,
            missing: f32,
            grid: &ConvStratGrid<'_>,
        ) -> anyhow::Result<()> {
            assert_eq!(missing, MISSING_FL32);
            *self.seen.lock().unwrap() = Some((dbz.to_owned(), grid.nx, grid.z_levels.to_vec()));
            Ok(())
        }
    }

    struct Failing;

    impl ConvStratClassifier for Failing {
        fn compute_partition(
            &mut self,
            _dbz: ArrayView3<'_, f32>,
            _missing: f32,
            _grid: &ConvStratGrid<'_>,
        ) -> anyhow::Result<()> {
            anyhow::bail!("partition failed")
        }
    }

    #[test]
    fn test_classifier_handoff() {
        let volume = sector_volume();
        let params = sector_params().conv_strat_field_name("DBZ").build().unwrap();
        let seen = Arc::new(Mutex::new(None));
        let mut engine = CartInterpBuilder::default()
            .params(&params)
            .classifier(Box::new(Recorder { seen: seen.clone() }))
            .build()
            .unwrap();
        let grid_vol = engine.interp_vol(&volume, &[]).unwrap();
        assert!(grid_vol.conv_strat_computed);
        let (dbz, nx, z_levels) = seen.lock().unwrap().take().unwrap();
        assert_eq!(dbz, grid_vol.field("DBZ").unwrap().data);
        assert_eq!(nx, 7);
        assert_eq!(z_levels, vec![0.5, 1.0, 1.5]);

        let mut engine = CartInterpBuilder::default()
            .params(&params)
            .classifier(Box::new(Failing))
            .build()
            .unwrap();
        let grid_vol = engine.interp_vol(&volume, &[]).unwrap();
        assert!(!grid_vol.conv_strat_computed);
        assert!(grid_vol.field("DBZ").unwrap().n_valid() > 0);
    }
}
