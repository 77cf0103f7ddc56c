// polar-cartgrid/src/search/mod.rs

mod limits;
mod matrix;
mod point;
mod quadrant;

pub use limits::{ScanSummary, SearchLimits};
pub use matrix::{MatrixField, SearchMatrix};
pub use point::{Quadrant, SearchPoint};
pub use quadrant::QuadrantMatrix;
