// polar-cartgrid/src/interp/mod.rs

mod accumulate;
mod cell;
mod engine;
mod errors;
mod neighbors;
mod output;

pub use accumulate::{Accumulator, Folded, Nearest, WeightedMean};
pub use cell::{CellInterpolator, DEBUG_FIELD_NAMES};
pub use engine::{CartInterp, CartInterpBuilder};
pub use errors::CartInterpError;
pub use neighbors::{ang_dist, GateWeights, Neighbors, RangeWeights};
pub use output::{GridVolume, OutputField};
