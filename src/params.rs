// polar-cartgrid/src/params.rs

use derive_builder::Builder;
use thiserror::Error;

/// Horizontal layout of the output grid. Units are km for a flat projection
/// and degrees for a lat/lon grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridXyGeom {
    pub nx: usize,
    pub ny: usize,
    pub minx: f64,
    pub miny: f64,
    pub dx: f64,
    pub dy: f64,
}

/// Vertical levels of the output grid, km above mean sea level.
#[derive(Clone, Debug, PartialEq)]
pub enum ZLevels {
    Uniform { nz: usize, minz: f64, dz: f64 },
    Explicit(Vec<f64>),
}

impl ZLevels {
    pub fn levels(&self) -> Vec<f64> {
        match self {
            ZLevels::Uniform { nz, minz, dz } => {
                (0..*nz).map(|iz| minz + iz as f64 * dz).collect()
            }
            ZLevels::Explicit(levels) => levels.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum GridProjection {
    /// Azimuthal equidistant km grid about the origin.
    #[default]
    Flat,
    /// x is longitude, y is latitude, both in degrees.
    LatLon,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum GridOrigin {
    #[default]
    RadarCentered,
    Fixed { lat: f64, lon: f64 },
}

/// Fold limits for one field. `None` limits take the volume's Nyquist.
#[derive(Clone, Debug, PartialEq)]
pub struct FoldedFieldParams {
    pub name: String,
    pub limits: Option<(f64, f64)>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundedFieldParams {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenamedFieldParams {
    pub name: String,
    pub output_name: String,
}

/// Resolved output grid.
#[derive(Clone, Debug, PartialEq)]
pub struct GridGeometry {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub minx: f64,
    pub miny: f64,
    pub dx: f64,
    pub dy: f64,
    pub z_levels: Vec<f64>,
    pub projection: GridProjection,
}

impl GridGeometry {
    pub fn x_at(&self, ix: usize) -> f64 {
        self.minx + ix as f64 * self.dx
    }

    pub fn y_at(&self, iy: usize) -> f64 {
        self.miny + iy as f64 * self.dy
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.nz, self.ny, self.nx)
    }

    pub fn n_points(&self) -> usize {
        self.nx * self.ny * self.nz
    }
}

#[derive(Builder, Clone, Debug)]
#[builder(build_fn(validate = "Self::validate", error = "ParamsError"))]
pub struct InterpParams {
    pub grid_xy: GridXyGeom,
    pub z_levels: ZLevels,
    #[builder(default)]
    pub projection: GridProjection,
    #[builder(default)]
    pub origin: GridOrigin,
    #[builder(default = "0.1")]
    pub search_res_el: f64,
    #[builder(default = "0.1")]
    pub search_res_az: f64,
    #[builder(default = "20.0")]
    pub search_az_overlap_deg: f64,
    #[builder(default = "true")]
    pub use_multiple_threads: bool,
    #[builder(default = "4")]
    pub n_compute_threads: usize,
    #[builder(default = "false")]
    pub use_nearest_neighbor: bool,
    #[builder(default = "1")]
    pub min_nvalid_for_interp: usize,
    #[builder(default = "0.5")]
    pub beam_width_fraction_for_data_limit_extension: f64,
    #[builder(default, setter(strip_option))]
    pub beam_width_deg_h: Option<f64>,
    #[builder(default, setter(strip_option))]
    pub beam_width_deg_v: Option<f64>,
    #[builder(default, setter(strip_option))]
    pub pseudo_earth_radius_ratio: Option<f64>,
    #[builder(default = "false")]
    pub output_debug_fields: bool,
    #[builder(default = "false")]
    pub write_search_matrix_fields: bool,
    #[builder(default, setter(into, strip_option))]
    pub conv_strat_field_name: Option<String>,
    #[builder(default)]
    pub folded_fields: Vec<FoldedFieldParams>,
    #[builder(default)]
    pub discrete_fields: Vec<String>,
    #[builder(default)]
    pub bounded_fields: Vec<BoundedFieldParams>,
    #[builder(default)]
    pub renamed_fields: Vec<RenamedFieldParams>,
}

impl InterpParams {
    pub fn grid_geometry(&self) -> GridGeometry {
        let z_levels = self.z_levels.levels();
        GridGeometry {
            nx: self.grid_xy.nx,
            ny: self.grid_xy.ny,
            nz: z_levels.len(),
            minx: self.grid_xy.minx,
            miny: self.grid_xy.miny,
            dx: self.grid_xy.dx,
            dy: self.grid_xy.dy,
            z_levels,
            projection: self.projection,
        }
    }

    pub fn n_threads(&self) -> usize {
        if self.use_multiple_threads {
            self.n_compute_threads.max(1)
        } else {
            1
        }
    }

    /// Re-runs the builder's checks.
    pub fn validate(&self) -> Result<(), ParamsError> {
        InterpParamsBuilder::validate_params(self)
    }
}

impl InterpParamsBuilder {
    fn validate(&self) -> Result<(), ParamsError> {
        if let Some(grid_xy) = &self.grid_xy {
            Self::validate_grid_xy(grid_xy)?;
        }
        if let Some(z_levels) = &self.z_levels {
            Self::validate_z_levels(z_levels)?;
        }
        if let Some(res) = self.search_res_el {
            Self::validate_positive("search_res_el", res)?;
        }
        if let Some(res) = self.search_res_az {
            Self::validate_positive("search_res_az", res)?;
        }
        if let Some(overlap) = self.search_az_overlap_deg {
            Self::validate_overlap(overlap)?;
        }
        if let Some(n_threads) = self.n_compute_threads {
            Self::validate_thread_count(n_threads)?;
        }
        if let Some(fraction) = self.beam_width_fraction_for_data_limit_extension {
            Self::validate_beam_width_fraction(fraction)?;
        }
        if let Some(bw) = self.beam_width_deg_h {
            Self::validate_optional_positive("beam_width_deg_h", bw)?;
        }
        if let Some(bw) = self.beam_width_deg_v {
            Self::validate_optional_positive("beam_width_deg_v", bw)?;
        }
        if let Some(ratio) = self.pseudo_earth_radius_ratio {
            Self::validate_optional_positive("pseudo_earth_radius_ratio", ratio)?;
        }
        if let Some(folded) = &self.folded_fields {
            Self::validate_folded_fields(folded)?;
        }
        if let Some(bounded) = &self.bounded_fields {
            Self::validate_bounded_fields(bounded)?;
        }
        Ok(())
    }

    /// Same checks as `build()`, applied to a finished value whose public
    /// fields may have been edited since.
    fn validate_params(params: &InterpParams) -> Result<(), ParamsError> {
        Self::validate_grid_xy(&params.grid_xy)?;
        Self::validate_z_levels(&params.z_levels)?;
        Self::validate_positive("search_res_el", params.search_res_el)?;
        Self::validate_positive("search_res_az", params.search_res_az)?;
        Self::validate_overlap(params.search_az_overlap_deg)?;
        Self::validate_thread_count(params.n_compute_threads)?;
        Self::validate_beam_width_fraction(params.beam_width_fraction_for_data_limit_extension)?;
        Self::validate_optional_positive("beam_width_deg_h", params.beam_width_deg_h)?;
        Self::validate_optional_positive("beam_width_deg_v", params.beam_width_deg_v)?;
        Self::validate_optional_positive(
            "pseudo_earth_radius_ratio",
            params.pseudo_earth_radius_ratio,
        )?;
        Self::validate_folded_fields(&params.folded_fields)?;
        Self::validate_bounded_fields(&params.bounded_fields)?;
        Ok(())
    }

    fn validate_thread_count(n_threads: usize) -> Result<(), ParamsError> {
        if n_threads == 0 {
            return Err(ParamsError::InvalidThreadCount);
        }
        Ok(())
    }

    fn validate_beam_width_fraction(fraction: f64) -> Result<(), ParamsError> {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(ParamsError::InvalidBeamWidthFraction(fraction));
        }
        Ok(())
    }

    fn validate_optional_positive(name: &str, val: Option<f64>) -> Result<(), ParamsError> {
        match val {
            Some(val) => Self::validate_positive(name, val),
            None => Ok(()),
        }
    }

    fn validate_folded_fields(folded: &[FoldedFieldParams]) -> Result<(), ParamsError> {
        for field in folded {
            if let Some((lower, upper)) = field.limits {
                if !(upper > lower) {
                    return Err(ParamsError::InvalidFoldLimits(field.name.clone(), lower, upper));
                }
            }
        }
        Ok(())
    }

    fn validate_bounded_fields(bounded: &[BoundedFieldParams]) -> Result<(), ParamsError> {
        for field in bounded {
            if !(field.max >= field.min) {
                return Err(ParamsError::InvalidBounds(
                    field.name.clone(),
                    field.min,
                    field.max,
                ));
            }
        }
        Ok(())
    }

    fn validate_grid_xy(grid_xy: &GridXyGeom) -> Result<(), ParamsError> {
        if grid_xy.nx == 0 || grid_xy.ny == 0 {
            return Err(ParamsError::InvalidGridCount(grid_xy.nx, grid_xy.ny));
        }
        Self::validate_positive("dx", grid_xy.dx)?;
        Self::validate_positive("dy", grid_xy.dy)?;
        if !grid_xy.minx.is_finite() || !grid_xy.miny.is_finite() {
            return Err(ParamsError::InvalidGridOrigin(grid_xy.minx, grid_xy.miny));
        }
        Ok(())
    }

    fn validate_z_levels(z_levels: &ZLevels) -> Result<(), ParamsError> {
        match z_levels {
            ZLevels::Uniform { nz, minz, dz } => {
                if *nz == 0 {
                    return Err(ParamsError::EmptyZLevels);
                }
                if !minz.is_finite() {
                    return Err(ParamsError::NonFiniteValue("minz".to_string(), *minz));
                }
                Self::validate_positive("dz", *dz)?;
            }
            ZLevels::Explicit(levels) => {
                if levels.is_empty() {
                    return Err(ParamsError::EmptyZLevels);
                }
                for pair in levels.windows(2) {
                    if !(pair[1] > pair[0]) {
                        return Err(ParamsError::NonIncreasingZLevels(pair[0], pair[1]));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_overlap(overlap: f64) -> Result<(), ParamsError> {
        if !overlap.is_finite() || overlap < 0.0 || overlap >= 360.0 {
            return Err(ParamsError::InvalidAzOverlap(overlap));
        }
        Ok(())
    }

    fn validate_positive(name: &str, val: f64) -> Result<(), ParamsError> {
        if !val.is_finite() || val <= 0.0 {
            return Err(ParamsError::NotPositive(name.to_string(), val));
        }
        Ok(())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum ParamsError {
    #[error("Unitialized field on InterpParamsBuilder: {0}")]
    UninitializedFieldError(String),
    #[error("grid counts must be > 0, got nx={0} ny={1}")]
    InvalidGridCount(usize, usize),
    #[error("grid origin must be finite, got minx={0} miny={1}")]
    InvalidGridOrigin(f64, f64),
    #[error("{0} must be > 0, got {1}")]
    NotPositive(String, f64),
    #[error("{0} must be finite, got {1}")]
    NonFiniteValue(String, f64),
    #[error("z levels must not be empty")]
    EmptyZLevels,
    #[error("z levels must be strictly increasing, got {0} followed by {1}")]
    NonIncreasingZLevels(f64, f64),
    #[error("search_az_overlap_deg must lie in [0, 360), got {0}")]
    InvalidAzOverlap(f64),
    #[error("n_compute_threads must be > 0")]
    InvalidThreadCount,
    #[error("beam_width_fraction_for_data_limit_extension must be >= 0, got {0}")]
    InvalidBeamWidthFraction(f64),
    #[error("fold limits for {0} must satisfy lower < upper, got [{1}, {2}]")]
    InvalidFoldLimits(String, f64, f64),
    #[error("bounds for {0} must satisfy min <= max, got [{1}, {2}]")]
    InvalidBounds(String, f64, f64),
}

impl From<derive_builder::UninitializedFieldError> for ParamsError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        ParamsError::UninitializedFieldError(err.field_name().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_xy() -> GridXyGeom {
        GridXyGeom {
            nx: 10,
            ny: 12,
            minx: -5.0,
            miny: -6.0,
            dx: 1.0,
            dy: 1.0,
        }
    }

    #[test]
    fn test_defaults() {
        let params = InterpParamsBuilder::default()
            .grid_xy(grid_xy())
            .z_levels(ZLevels::Uniform {
                nz: 3,
                minz: 0.5,
                dz: 0.5,
            })
            .build()
            .unwrap();
        assert_eq!(params.search_res_el, 0.1);
        assert_eq!(params.search_res_az, 0.1);
        assert_eq!(params.search_az_overlap_deg, 20.0);
        assert_eq!(params.min_nvalid_for_interp, 1);
        assert_eq!(params.n_threads(), 4);
        assert_eq!(params.beam_width_deg_h, None);
        let geom = params.grid_geometry();
        assert_eq!(geom.shape(), (3, 12, 10));
        assert_eq!(geom.z_levels, vec![0.5, 1.0, 1.5]);
        assert_eq!(geom.x_at(2), -3.0);
        assert_eq!(geom.y_at(0), -6.0);
    }

    #[test]
    fn test_missing_grid() {
        let err = InterpParamsBuilder::default()
            .z_levels(ZLevels::Explicit(vec![1.0]))
            .build()
            .unwrap_err();
        assert_eq!(err, ParamsError::UninitializedFieldError("grid_xy".to_string()));
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let mut bad = grid_xy();
        bad.nx = 0;
        let err = InterpParamsBuilder::default()
            .grid_xy(bad)
            .z_levels(ZLevels::Explicit(vec![1.0]))
            .build()
            .unwrap_err();
        assert_eq!(err, ParamsError::InvalidGridCount(0, 12));

        let mut bad = grid_xy();
        bad.dy = -1.0;
        let err = InterpParamsBuilder::default()
            .grid_xy(bad)
            .z_levels(ZLevels::Explicit(vec![1.0]))
            .build()
            .unwrap_err();
        assert_eq!(err, ParamsError::NotPositive("dy".to_string(), -1.0));

        let err = InterpParamsBuilder::default()
            .grid_xy(grid_xy())
            .z_levels(ZLevels::Uniform {
                nz: 2,
                minz: 0.0,
                dz: 0.0,
            })
            .build()
            .unwrap_err();
        assert_eq!(err, ParamsError::NotPositive("dz".to_string(), 0.0));

        let err = InterpParamsBuilder::default()
            .grid_xy(grid_xy())
            .z_levels(ZLevels::Explicit(vec![2.0, 1.0]))
            .build()
            .unwrap_err();
        assert_eq!(err, ParamsError::NonIncreasingZLevels(2.0, 1.0));
    }

    #[test]
    fn test_rejects_bad_tunables() {
        let err = InterpParamsBuilder::default()
            .grid_xy(grid_xy())
            .z_levels(ZLevels::Explicit(vec![1.0]))
            .n_compute_threads(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ParamsError::InvalidThreadCount);

        let err = InterpParamsBuilder::default()
            .grid_xy(grid_xy())
            .z_levels(ZLevels::Explicit(vec![1.0]))
            .folded_fields(vec![FoldedFieldParams {
                name: "VEL".to_string(),
                limits: Some((10.0, -10.0)),
            }])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ParamsError::InvalidFoldLimits("VEL".to_string(), 10.0, -10.0)
        );
    }

    #[test]
    fn test_single_thread_toggle() {
        let params = InterpParamsBuilder::default()
            .grid_xy(grid_xy())
            .z_levels(ZLevels::Explicit(vec![1.0]))
            .use_multiple_threads(false)
            .n_compute_threads(8)
            .build()
            .unwrap();
        assert_eq!(params.n_threads(), 1);
    }

    #[test]
    fn test_validate_after_edit() {
        let mut params = InterpParamsBuilder::default()
            .grid_xy(grid_xy())
            .z_levels(ZLevels::Explicit(vec![1.0]))
            .build()
            .unwrap();
        assert_eq!(params.validate(), Ok(()));
        params.search_res_az = 0.0;
        assert_eq!(
            params.validate(),
            Err(ParamsError::NotPositive("search_res_az".to_string(), 0.0))
        );
        params.search_res_az = 0.1;
        params.bounded_fields = vec![BoundedFieldParams {
            name: "DBZ".to_string(),
            min: 10.0,
            max: 0.0,
        }];
        assert_eq!(
            params.validate(),
            Err(ParamsError::InvalidBounds("DBZ".to_string(), 10.0, 0.0))
        );
    }
}
