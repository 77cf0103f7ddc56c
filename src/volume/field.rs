// polar-cartgrid/src/volume/field.rs

use libm::{atan2, cos, sin};
use std::f64::consts::PI;

/// Wrap limits of a circular field such as radial velocity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoldLimits {
    pub lower: f64,
    pub upper: f64,
}

impl FoldLimits {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Symmetric limits about zero, as used for Nyquist-folded velocities.
    pub fn symmetric(limit: f64) -> Self {
        Self::new(-limit.abs(), limit.abs())
    }

    pub fn range(&self) -> f64 {
        self.upper - self.lower
    }

    /// Maps a value in the fold range onto [-pi, pi).
    pub fn angle(&self, val: f64) -> f64 {
        -PI + (val - self.lower) / self.range() * 2.0 * PI
    }

    /// Inverse of [`FoldLimits::angle`].
    pub fn value(&self, angle: f64) -> f64 {
        ((angle + PI) / (2.0 * PI)) * self.range() + self.lower
    }

    /// Circular mean of the angle whose weighted components are `sum_cos`
    /// and `sum_sin`, mapped back into the fold range.
    pub fn value_from_components(&self, sum_cos: f64, sum_sin: f64) -> f64 {
        self.value(atan2(sum_sin, sum_cos))
    }

    pub fn components(&self, val: f64) -> (f64, f64) {
        let angle = self.angle(val);
        (cos(angle), sin(angle))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldKind {
    Continuous,
    Discrete,
    Folded(FoldLimits),
}

/// Descriptor of one field to interpolate.
#[derive(Clone, Debug, PartialEq)]
pub struct InterpField {
    pub name: String,
    pub output_name: String,
    pub long_name: String,
    pub units: String,
    pub is_discrete: bool,
    pub folds: Option<FoldLimits>,
    pub bounds: Option<(f64, f64)>,
    pub scale: f64,
    pub offset: f64,
}

impl InterpField {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            output_name: name.to_string(),
            long_name: String::new(),
            units: String::new(),
            is_discrete: false,
            folds: None,
            bounds: None,
            scale: 1.0,
            offset: 0.0,
        }
    }

    pub fn discrete(mut self, is_discrete: bool) -> Self {
        self.is_discrete = is_discrete;
        self
    }

    pub fn folded(mut self, limits: FoldLimits) -> Self {
        self.folds = Some(limits);
        self
    }

    pub fn bounded(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some((min, max));
        self
    }

    pub fn renamed(mut self, output_name: &str) -> Self {
        self.output_name = output_name.to_string();
        self
    }

    pub fn scaled(mut self, scale: f64, offset: f64) -> Self {
        self.scale = scale;
        self.offset = offset;
        self
    }

    pub fn described(mut self, long_name: &str, units: &str) -> Self {
        self.long_name = long_name.to_string();
        self.units = units.to_string();
        self
    }

    /// Discrete wins over folded; global nearest-neighbour mode turns every
    /// field discrete.
    pub fn kind(&self, use_nearest_neighbor: bool) -> FieldKind {
        if self.is_discrete || use_nearest_neighbor {
            return FieldKind::Discrete;
        }
        match self.folds {
            Some(limits) => FieldKind::Folded(limits),
            None => FieldKind::Continuous,
        }
    }

    pub fn apply_bounds(&self, val: f64) -> f64 {
        match self.bounds {
            Some((min, max)) => val.max(min).min(max),
            None => val,
        }
    }
}
