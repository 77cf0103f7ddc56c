use pretty_env_logger;
use std::sync::Once;

static INIT: Once = Once::new();

pub fn _setup_pretty_env_logger_default() {
    INIT.call_once(|| {
        pretty_env_logger::init();
    });
}

/// Sentinel for gates and grid cells without data.
pub const MISSING_FL32: f32 = -9999.0;

pub use conv_strat::{ConvStratClassifier, ConvStratGrid};
pub use interp::{CartInterp, CartInterpBuilder, CartInterpError, GridVolume, OutputField};
pub use params::{InterpParams, InterpParamsBuilder, ParamsError};
pub use volume::{InterpField, PolarRay, RadarSite, RayVolume};
pub mod conv_strat;
pub mod geometry;
pub mod interp;
pub mod params;
pub mod scheduler;
pub mod search;
pub mod synthetic;
pub mod volume;
