// polar-cartgrid/src/volume/volume.rs

use super::field::{FoldLimits, InterpField};
use super::ray::PolarRay;
use log::{debug, warn};
use ndarray::Array1;
use ndarray_stats::errors::MinMaxError;
use ndarray_stats::QuantileExt;
use std::collections::BTreeSet;

const SECTOR_HIST_BINS_PER_DEG: f64 = 10.0;
const SECTOR_HIST_NBINS: usize = 3600;

/// Sensor location and beam geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadarSite {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub beam_width_h_deg: f64,
    pub beam_width_v_deg: f64,
}

impl Default for RadarSite {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_km: 0.0,
            beam_width_h_deg: 1.0,
            beam_width_v_deg: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateGeometry {
    pub start_range_km: f64,
    pub gate_spacing_km: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AzimuthCoverage {
    Full360,
    Sector {
        start_deg: f64,
        end_deg: f64,
        spans_north: bool,
    },
}

impl AzimuthCoverage {
    pub fn is_sector(&self) -> bool {
        matches!(self, AzimuthCoverage::Sector { .. })
    }
}

/// The rays of one volume, in ingest order.
#[derive(Clone, Debug, Default)]
pub struct RayVolume {
    site: RadarSite,
    rays: Vec<PolarRay>,
}

impl RayVolume {
    pub fn new(site: RadarSite, rays: Vec<PolarRay>) -> Self {
        Self { site, rays }
    }

    pub fn site(&self) -> &RadarSite {
        &self.site
    }

    pub fn rays(&self) -> &[PolarRay] {
        &self.rays
    }

    pub fn push(&mut self, ray: PolarRay) {
        self.rays.push(ray);
    }

    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    /// Unique field names over all rays, sorted.
    pub fn field_names(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self.rays.iter().flat_map(|ray| ray.field_names()).collect();
        names.into_iter().map(|name| name.to_string()).collect()
    }

    pub fn default_fields(&self) -> Vec<InterpField> {
        self.field_names()
            .iter()
            .map(|name| InterpField::new(name))
            .collect()
    }

    /// First Nyquist velocity found on any ray.
    pub fn nyquist(&self) -> Option<f64> {
        self.rays.iter().find_map(|ray| ray.nyquist_mps)
    }

    pub fn nyquist_fold_limits(&self) -> Option<FoldLimits> {
        self.nyquist().map(FoldLimits::symmetric)
    }

    pub fn elevation_extent(&self) -> Result<(f64, f64), MinMaxError> {
        let elevs: Array1<f64> = self.rays.iter().map(|ray| ray.elevation).collect();
        Ok((*elevs.min()?, *elevs.max()?))
    }

    /// Most common (start range, gate spacing) pair. Ties go to the pair seen
    /// first; the gate count is the largest over all rays.
    pub fn predominant_gate_geometry(&self) -> Option<GateGeometry> {
        let mut tally: Vec<((f64, f64), usize)> = Vec::new();
        for ray in &self.rays {
            let key = (ray.start_range_km, ray.gate_spacing_km);
            match tally.iter_mut().find(|(k, _)| *k == key) {
                Some((_, count)) => *count += 1,
                None => tally.push((key, 1)),
            }
        }
        let mut best: Option<((f64, f64), usize)> = None;
        for (key, count) in tally.iter() {
            if best.map_or(true, |(_, best_count)| *count > best_count) {
                best = Some((*key, *count));
            }
        }
        let ((start_range_km, gate_spacing_km), count) = best?;
        if count < self.rays.len() {
            warn!(
                "{} of {} rays differ from predominant gate geometry start={} km spacing={} km",
                self.rays.len() - count,
                self.rays.len(),
                start_range_km,
                gate_spacing_km
            );
        }
        Some(GateGeometry {
            start_range_km,
            gate_spacing_km,
        })
    }

    /// Median azimuth step between consecutive rays of the same sweep.
    pub fn azimuth_delta(&self) -> f64 {
        let mut deltas: Vec<f64> = self
            .rays
            .windows(2)
            .filter(|pair| pair[0].sweep_index == pair[1].sweep_index)
            .map(|pair| {
                let delta = (pair[1].azimuth - pair[0].azimuth).abs();
                if delta > 180.0 {
                    360.0 - delta
                } else {
                    delta
                }
            })
            .collect();
        let delta = median(&mut deltas).unwrap_or(1.0);
        debug!("azimuth delta: {}", delta);
        delta
    }

    /// Median step between the distinct mean sweep elevations.
    pub fn elevation_delta(&self) -> f64 {
        let mut sweeps: Vec<(usize, f64, usize)> = Vec::new();
        for ray in &self.rays {
            match sweeps.iter_mut().find(|(idx, _, _)| *idx == ray.sweep_index) {
                Some((_, sum, count)) => {
                    *sum += ray.elevation;
                    *count += 1;
                }
                None => sweeps.push((ray.sweep_index, ray.elevation, 1)),
            }
        }
        let mut elevs: Vec<f64> = sweeps
            .iter()
            .map(|(_, sum, count)| sum / *count as f64)
            .collect();
        elevs.sort_by(|a, b| a.total_cmp(b));
        elevs.dedup_by(|a, b| (*a - *b).abs() < 1.0e-3);
        let mut deltas: Vec<f64> = elevs.windows(2).map(|pair| pair[1] - pair[0]).collect();
        let delta = median(&mut deltas).unwrap_or(1.0);
        debug!("elevation delta: {}", delta);
        delta
    }

    /// Finds the occupied azimuth sector. The scan counts as a sector when
    /// the widest empty azimuth gap exceeds `2 * pad_deg + 1`; the returned
    /// sector is padded by `pad_deg` on both sides.
    pub fn locate_data_sector(&self, pad_deg: f64) -> Option<AzimuthCoverage> {
        if self.rays.is_empty() {
            return None;
        }
        let mut occupied = vec![false; SECTOR_HIST_NBINS];
        for ray in &self.rays {
            let ibin = (ray.azimuth * SECTOR_HIST_BINS_PER_DEG).floor() as i64;
            occupied[ibin.rem_euclid(SECTOR_HIST_NBINS as i64) as usize] = true;
        }
        let first_occupied = occupied.iter().position(|&set| set)?;

        // walk the circle once starting at an occupied bin so every empty
        // run is contiguous
        let mut gap_start = 0;
        let mut gap_len = 0;
        let mut run_start = 0;
        let mut run_len = 0;
        for step in 1..=SECTOR_HIST_NBINS {
            let ibin = (first_occupied + step) % SECTOR_HIST_NBINS;
            if occupied[ibin] {
                if run_len > gap_len {
                    gap_start = run_start;
                    gap_len = run_len;
                }
                run_len = 0;
            } else {
                if run_len == 0 {
                    run_start = ibin;
                }
                run_len += 1;
            }
        }

        let gap_deg = gap_len as f64 / SECTOR_HIST_BINS_PER_DEG;
        if gap_len == 0 || gap_deg <= 2.0 * pad_deg + 1.0 {
            debug!("full 360 scan, widest gap {} deg", gap_deg);
            return Some(AzimuthCoverage::Full360);
        }

        let data_start_bin = (gap_start + gap_len) % SECTOR_HIST_NBINS;
        let data_end_bin = (gap_start + SECTOR_HIST_NBINS - 1) % SECTOR_HIST_NBINS;
        let mut start_deg = data_start_bin as f64 / SECTOR_HIST_BINS_PER_DEG - pad_deg;
        let mut end_deg = (data_end_bin + 1) as f64 / SECTOR_HIST_BINS_PER_DEG + pad_deg;
        if data_end_bin < data_start_bin {
            end_deg += 360.0;
        }
        while start_deg < 0.0 {
            start_deg += 360.0;
            end_deg += 360.0;
        }
        while start_deg >= 360.0 {
            start_deg -= 360.0;
            end_deg -= 360.0;
        }
        let spans_north = end_deg > 360.0;
        debug!(
            "sector scan: start {} deg, end {} deg, spans north {}",
            start_deg, end_deg, spans_north
        );
        Some(AzimuthCoverage::Sector {
            start_deg,
            end_deg,
            spans_north,
        })
    }
}

fn median(vals: &mut [f64]) -> Option<f64> {
    if vals.is_empty() {
        return None;
    }
    vals.sort_by(|a, b| a.total_cmp(b));
    Some(vals[vals.len() / 2])
}
