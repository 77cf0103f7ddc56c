// polar-cartgrid/src/geometry/mod.rs

mod beam_height;
mod grid_loc;
mod projection;

pub use beam_height::{BeamGeometry, BeamHeight, EARTH_RADIUS_KM, STANDARD_PSEUDO_EARTH_RATIO};
pub use grid_loc::{GridLoc, GridLocCache};
pub use projection::{latlon_plus_r_theta, latlon_to_r_theta, Projection, GREAT_CIRCLE_RADIUS_KM};
