// polar-cartgrid/src/synthetic.rs

use crate::volume::{PolarRay, RadarSite, RayVolume};
use log::debug;
use thiserror::Error;

type FieldFn = dyn Fn(f64, f64, f64) -> f32 + Send + Sync;

/// Builds deterministic PPI volumes. Each field is a function of
/// (azimuth deg, elevation deg, gate range km).
#[derive(Default)]
pub struct SyntheticVolumeBuilder<'a> {
    site: Option<&'a RadarSite>,
    elevations: Option<&'a [f64]>,
    az_start: Option<f64>,
    az_step: Option<f64>,
    n_az: Option<usize>,
    n_gates: Option<usize>,
    start_range_km: Option<f64>,
    gate_spacing_km: Option<f64>,
    nyquist_mps: Option<f64>,
    fields: Vec<(String, Box<FieldFn>)>,
}

impl<'a> SyntheticVolumeBuilder<'a> {
    pub fn build(&self) -> Result<RayVolume, SyntheticVolumeError> {
        let elevations = self
            .elevations
            .ok_or_else(|| SyntheticVolumeError::UninitializedFieldError("elevations".to_string()))?;
        let n_az = self
            .n_az
            .ok_or_else(|| SyntheticVolumeError::UninitializedFieldError("n_az".to_string()))?;
        let az_step = self
            .az_step
            .ok_or_else(|| SyntheticVolumeError::UninitializedFieldError("az_step".to_string()))?;
        Self::validate_az_step(az_step)?;
        let n_gates = self
            .n_gates
            .ok_or_else(|| SyntheticVolumeError::UninitializedFieldError("n_gates".to_string()))?;
        let gate_spacing_km = self.gate_spacing_km.unwrap_or(1.0);
        Self::validate_gate_spacing(gate_spacing_km)?;
        if self.fields.is_empty() {
            return Err(SyntheticVolumeError::NoFields);
        }
        let site = self.site.copied().unwrap_or_default();
        let az_start = self.az_start.unwrap_or(0.0);
        let start_range_km = self.start_range_km.unwrap_or(0.0);

        let mut rays = Vec::with_capacity(elevations.len() * n_az);
        for (isweep, el) in elevations.iter().enumerate() {
            for iaz in 0..n_az {
                let az = az_start + iaz as f64 * az_step;
                let mut ray = PolarRay::new(az, *el, isweep, start_range_km, gate_spacing_km);
                for (name, values) in self.fields.iter() {
                    let gates = (0..n_gates)
                        .map(|igate| {
                            let range = start_range_km + igate as f64 * gate_spacing_km;
                            values(ray.azimuth, *el, range)
                        })
                        .collect();
                    ray.add_field(name, gates);
                }
                if let Some(nyquist) = self.nyquist_mps {
                    ray.nyquist(nyquist);
                }
                rays.push(ray);
            }
        }
        debug!(
            "synthetic volume: {} sweeps x {} rays x {} gates",
            elevations.len(),
            n_az,
            n_gates
        );
        Ok(RayVolume::new(site, rays))
    }

    fn validate_az_step(az_step: f64) -> Result<(), SyntheticVolumeError> {
        if !(az_step > 0.0) {
            return Err(SyntheticVolumeError::InvalidAzStep(az_step));
        }
        Ok(())
    }

    fn validate_gate_spacing(gate_spacing_km: f64) -> Result<(), SyntheticVolumeError> {
        if !(gate_spacing_km > 0.0) {
            return Err(SyntheticVolumeError::InvalidGateSpacing(gate_spacing_km));
        }
        Ok(())
    }

    pub fn site(&mut self, site: &'a RadarSite) -> &mut Self {
        self.site = Some(site);
        self
    }
    pub fn elevations(&mut self, elevations: &'a [f64]) -> &mut Self {
        self.elevations = Some(elevations);
        self
    }
    pub fn azimuths(&mut self, az_start: f64, az_step: f64, n_az: usize) -> &mut Self {
        self.az_start = Some(az_start);
        self.az_step = Some(az_step);
        self.n_az = Some(n_az);
        self
    }
    pub fn gates(&mut self, start_range_km: f64, gate_spacing_km: f64, n_gates: usize) -> &mut Self {
        self.start_range_km = Some(start_range_km);
        self.gate_spacing_km = Some(gate_spacing_km);
        self.n_gates = Some(n_gates);
        self
    }
    pub fn nyquist(&mut self, nyquist_mps: f64) -> &mut Self {
        self.nyquist_mps = Some(nyquist_mps);
        self
    }
    pub fn field<F>(&mut self, name: &str, values: F) -> &mut Self
    where
        F: Fn(f64, f64, f64) -> f32 + Send + Sync + 'static,
    {
        self.fields.push((name.to_string(), Box::new(values)));
        self
    }
}

#[derive(Error, Debug)]
pub enum SyntheticVolumeError {
    #[error("Unitialized field on SyntheticVolumeBuilder: {0}")]
    UninitializedFieldError(String),
    #[error("az_step must be > 0, got {0}")]
    InvalidAzStep(f64),
    #[error("gate spacing must be > 0, got {0}")]
    InvalidGateSpacing(f64),
    #[error("at least one field is required")]
    NoFields,
}
