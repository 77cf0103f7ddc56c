// polar-cartgrid/src/volume/mod.rs

mod field;
mod ray;
#[allow(clippy::module_inception)]
mod volume;

pub use field::{FieldKind, FoldLimits, InterpField};
pub use ray::{is_missing, InterpRay, PolarRay};
pub use volume::{AzimuthCoverage, GateGeometry, RadarSite, RayVolume};
