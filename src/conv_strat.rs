// polar-cartgrid/src/conv_strat.rs

use ndarray::ArrayView3;

/// Grid description handed to a convective/stratiform classifier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConvStratGrid<'a> {
    pub nx: usize,
    pub ny: usize,
    pub dx: f64,
    pub dy: f64,
    pub minx: f64,
    pub miny: f64,
    pub z_levels: &'a [f64],
    pub is_lat_lon: bool,
}

/// External partition of a finished reflectivity grid. Results stay with
/// the implementor.
pub trait ConvStratClassifier: Send {
    fn compute_partition(
        &mut self,
        dbz: ArrayView3<'_, f32>,
        missing: f32,
        grid: &ConvStratGrid<'_>,
    ) -> anyhow::Result<()>;
}
