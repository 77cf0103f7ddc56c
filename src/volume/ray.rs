// polar-cartgrid/src/volume/ray.rs

use super::field::InterpField;
use crate::MISSING_FL32;
use std::collections::HashMap;

/// One ingested beam: pointing angles, gate geometry and per-gate values for
/// each field. Values equal to [`MISSING_FL32`] or NaN are treated as missing.
#[derive(Clone, Debug)]
pub struct PolarRay {
    pub azimuth: f64,
    pub elevation: f64,
    pub sweep_index: usize,
    pub start_range_km: f64,
    pub gate_spacing_km: f64,
    /// Angles used only for the edge-of-data checks.
    pub az_for_limits: f64,
    pub el_for_limits: f64,
    pub nyquist_mps: Option<f64>,
    fields: HashMap<String, Vec<f32>>,
}

impl PolarRay {
    pub fn new(
        azimuth: f64,
        elevation: f64,
        sweep_index: usize,
        start_range_km: f64,
        gate_spacing_km: f64,
    ) -> Self {
        let azimuth = azimuth.rem_euclid(360.0);
        Self {
            azimuth,
            elevation,
            sweep_index,
            start_range_km,
            gate_spacing_km,
            az_for_limits: azimuth,
            el_for_limits: elevation,
            nyquist_mps: None,
            fields: HashMap::new(),
        }
    }

    pub fn limits_angles(&mut self, az_for_limits: f64, el_for_limits: f64) -> &mut Self {
        self.az_for_limits = az_for_limits.rem_euclid(360.0);
        self.el_for_limits = el_for_limits;
        self
    }

    pub fn nyquist(&mut self, nyquist_mps: f64) -> &mut Self {
        self.nyquist_mps = Some(nyquist_mps);
        self
    }

    pub fn add_field(&mut self, name: &str, values: Vec<f32>) -> &mut Self {
        self.fields.insert(name.to_string(), values);
        self
    }

    pub fn field(&self, name: &str) -> Option<&[f32]> {
        self.fields.get(name).map(|values| values.as_slice())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|name| name.as_str())
    }
}

pub fn is_missing(val: f32) -> bool {
    val.is_nan() || val == MISSING_FL32
}

/// Read-only view of a ray prepared for one interpolation pass: the field
/// slices are resolved once into the order of the requested fields.
#[derive(Debug)]
pub struct InterpRay<'a> {
    pub az: f64,
    pub el: f64,
    pub sweep_index: usize,
    pub az_for_limits: f64,
    pub el_for_limits: f64,
    gates: Vec<Option<&'a [f32]>>,
}

impl<'a> InterpRay<'a> {
    pub fn new(ray: &'a PolarRay, fields: &[InterpField]) -> Self {
        Self {
            az: ray.azimuth,
            el: ray.elevation,
            sweep_index: ray.sweep_index,
            az_for_limits: ray.az_for_limits,
            el_for_limits: ray.el_for_limits,
            gates: fields.iter().map(|field| ray.field(&field.name)).collect(),
        }
    }

    /// Gate value of field `ifield`, `None` when out of range or missing.
    pub fn value(&self, ifield: usize, igate: i64) -> Option<f32> {
        if igate < 0 {
            return None;
        }
        let values = self.gates.get(ifield).copied().flatten()?;
        let val = *values.get(igate as usize)?;
        if is_missing(val) {
            None
        } else {
            Some(val)
        }
    }

    pub fn has_field(&self, ifield: usize) -> bool {
        matches!(self.gates.get(ifield), Some(Some(_)))
    }
}
