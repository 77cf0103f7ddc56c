// polar-cartgrid/src/interp/output.rs

use crate::params::GridGeometry;
use crate::search::MatrixField;
use crate::MISSING_FL32;
use ndarray::{Array1, Array3};
use ndarray_stats::QuantileExt;

/// One interpolated field, indexed `[iz, iy, ix]`.
#[derive(Clone, Debug, PartialEq)]
pub struct OutputField {
    pub name: String,
    pub long_name: String,
    pub units: String,
    /// Packing hints carried through from the input field.
    pub scale: f64,
    pub offset: f64,
    pub data: Array3<f32>,
}

impl OutputField {
    pub fn n_valid(&self) -> usize {
        self.data.iter().filter(|&&val| val != MISSING_FL32).count()
    }

    /// Min and max over non-missing cells.
    pub fn valid_range(&self) -> Option<(f32, f32)> {
        let valid = Array1::from_iter(
            self.data
                .iter()
                .copied()
                .filter(|&val| val != MISSING_FL32),
        );
        let min = *valid.min().ok()?;
        let max = *valid.max().ok()?;
        Some((min, max))
    }
}

/// Everything produced for one volume.
#[derive(Clone, Debug, PartialEq)]
pub struct GridVolume {
    pub grid: GridGeometry,
    pub fields: Vec<OutputField>,
    pub debug_fields: Vec<OutputField>,
    pub search_matrix_fields: Vec<MatrixField>,
    pub missing_fields: Vec<String>,
    pub conv_strat_computed: bool,
}

impl GridVolume {
    pub fn field(&self, name: &str) -> Option<&OutputField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn debug_field(&self, name: &str) -> Option<&OutputField> {
        self.debug_fields.iter().find(|field| field.name == name)
    }
}
