// polar-cartgrid/src/interp/errors.rs

use crate::params::ParamsError;
use ndarray_stats::errors::MinMaxError;
use rayon::ThreadPoolBuildError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartInterpError {
    #[error("Unitialized field on CartInterpBuilder: {0}")]
    UninitializedFieldError(String),
    #[error("No data: {0}")]
    NoData(String),
    #[error(transparent)]
    Params(#[from] ParamsError),
    #[error(transparent)]
    ThreadPool(#[from] ThreadPoolBuildError),
    #[error(transparent)]
    MinMax(#[from] MinMaxError),
}
