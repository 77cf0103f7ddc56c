// polar-cartgrid/src/search/limits.rs

use crate::params::InterpParams;
use crate::volume::AzimuthCoverage;
use log::debug;

/// Angular extent and beam geometry of a scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanSummary {
    pub min_el_deg: f64,
    pub max_el_deg: f64,
    pub delta_el_deg: f64,
    pub delta_az_deg: f64,
    pub beam_width_h_deg: f64,
    pub beam_width_v_deg: f64,
}

impl ScanSummary {
    pub fn search_radius_el(&self) -> f64 {
        self.delta_el_deg + self.beam_width_v_deg + 1.0
    }

    pub fn search_radius_az(&self) -> f64 {
        self.delta_az_deg + self.beam_width_h_deg + 1.0
    }
}

/// Discretisation of (elevation, azimuth) space shared by the four
/// quadrant matrices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchLimits {
    pub res_el: f64,
    pub res_az: f64,
    pub min_el: f64,
    pub max_el: f64,
    pub n_el: usize,
    pub min_az: f64,
    pub n_az: usize,
    pub radius_el: f64,
    pub radius_az: f64,
    pub max_dist_el: u32,
    pub max_dist_az: u32,
    pub max_count: u32,
    pub overlap_deg: f64,
    pub coverage: AzimuthCoverage,
}

impl SearchLimits {
    pub fn compute(params: &InterpParams, scan: &ScanSummary, coverage: AzimuthCoverage) -> Self {
        let res_el = params.search_res_el;
        let res_az = params.search_res_az;

        let elev_extension =
            scan.beam_width_v_deg * params.beam_width_fraction_for_data_limit_extension * 2.0;
        let data_min_el = scan.min_el_deg - elev_extension;
        let data_max_el = scan.max_el_deg + elev_extension;

        let radius_el = scan.search_radius_el();
        let min_el = ((data_min_el - radius_el) / res_el).floor() * res_el;
        let max_el = ((data_max_el + radius_el) / res_el + 1.0).floor() * res_el;
        let n_el = Self::count(max_el - min_el, res_el);
        let max_dist_el = (radius_el / res_el + 0.5) as u32;

        let radius_az = scan.search_radius_az();
        let (min_az, az_range) = match coverage {
            AzimuthCoverage::Sector {
                start_deg, end_deg, ..
            } => (start_deg, end_deg - start_deg),
            AzimuthCoverage::Full360 => (0.0, 360.0 + params.search_az_overlap_deg),
        };
        let n_az = Self::count(az_range, res_az);
        let max_dist_az = (radius_az / res_az + 0.5) as u32;
        let max_count = max_dist_el.max(max_dist_az);

        debug!(
            "search radius el {} deg, az {} deg, max dist el {} az {}",
            radius_el, radius_az, max_dist_el, max_dist_az
        );
        debug!(
            "search el [{}, {}] n_el {}, min az {} n_az {}",
            min_el, max_el, n_el, min_az, n_az
        );

        Self {
            res_el,
            res_az,
            min_el,
            max_el,
            n_el,
            min_az,
            n_az,
            radius_el,
            radius_az,
            max_dist_el,
            max_dist_az,
            max_count,
            overlap_deg: params.search_az_overlap_deg,
            coverage,
        }
    }

    /// Number of cells spanning `range` inclusive of both ends, tolerant of
    /// rounding in `range / res`.
    fn count(range: f64, res: f64) -> usize {
        (range / res + 1.0 + 1.0e-6) as usize
    }

    pub fn el_index(&self, el: f64) -> Option<usize> {
        Self::index(el, self.min_el, self.res_el, self.n_el)
    }

    pub fn az_index(&self, az: f64) -> Option<usize> {
        Self::index(az, self.min_az, self.res_az, self.n_az)
    }

    fn index(val: f64, min: f64, res: f64, n: usize) -> Option<usize> {
        let idx = ((val - min) / res + 0.5).floor();
        if idx < 0.0 || idx >= n as f64 {
            None
        } else {
            Some(idx as usize)
        }
    }

    pub fn el_at(&self, iel: usize) -> f64 {
        self.min_el + iel as f64 * self.res_el
    }

    pub fn az_at(&self, iaz: usize) -> f64 {
        self.min_az + iaz as f64 * self.res_az
    }

    /// Brings an azimuth onto the matrix's monotonic azimuth axis: past 360
    /// for the low part of a north-spanning sector, or into the duplicated
    /// band for a full circle.
    pub fn condition_az(&self, az: f64) -> f64 {
        match self.coverage {
            AzimuthCoverage::Sector {
                start_deg,
                spans_north,
                ..
            } => {
                if spans_north && az < start_deg {
                    az + 360.0
                } else {
                    az
                }
            }
            AzimuthCoverage::Full360 => {
                if az < self.overlap_deg / 2.0 {
                    az + 360.0
                } else {
                    az
                }
            }
        }
    }

    pub fn is_sector(&self) -> bool {
        self.coverage.is_sector()
    }
}
