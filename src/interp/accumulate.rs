// polar-cartgrid/src/interp/accumulate.rs

use crate::volume::FoldLimits;

/// Collects weighted gate samples for one field at one grid cell.
pub trait Accumulator {
    fn add(&mut self, val: f64, wt: f64);
    fn n_contrib(&self) -> usize;
    /// Combined value, `None` when nothing usable was collected.
    fn value(&self) -> Option<f64>;
}

/// Keeps the sample with the largest weight. The first sample is always
/// taken; later ones replace it only on a strictly larger weight.
#[derive(Debug, Default)]
pub struct Nearest {
    closest: Option<(f64, f64)>,
    n_contrib: usize,
}

impl Accumulator for Nearest {
    fn add(&mut self, val: f64, wt: f64) {
        self.n_contrib += 1;
        match self.closest {
            Some((_, max_wt)) if wt <= max_wt => {}
            _ => self.closest = Some((val, wt)),
        }
    }

    fn n_contrib(&self) -> usize {
        self.n_contrib
    }

    fn value(&self) -> Option<f64> {
        self.closest.map(|(val, _)| val)
    }
}

#[derive(Debug, Default)]
pub struct WeightedMean {
    sum_vals: f64,
    sum_wts: f64,
    n_contrib: usize,
}

impl Accumulator for WeightedMean {
    fn add(&mut self, val: f64, wt: f64) {
        self.sum_vals += val * wt;
        self.sum_wts += wt;
        self.n_contrib += 1;
    }

    fn n_contrib(&self) -> usize {
        self.n_contrib
    }

    fn value(&self) -> Option<f64> {
        if self.sum_wts > 0.0 {
            Some(self.sum_vals / self.sum_wts)
        } else {
            None
        }
    }
}

/// Circular mean: samples are mapped onto the unit circle, averaged as
/// vectors and mapped back into the fold range.
#[derive(Debug)]
pub struct Folded {
    limits: FoldLimits,
    sum_x: f64,
    sum_y: f64,
    n_contrib: usize,
}

impl Folded {
    pub fn new(limits: FoldLimits) -> Self {
        Self {
            limits,
            sum_x: 0.0,
            sum_y: 0.0,
            n_contrib: 0,
        }
    }
}

impl Accumulator for Folded {
    fn add(&mut self, val: f64, wt: f64) {
        let (x, y) = self.limits.components(val);
        self.sum_x += x * wt;
        self.sum_y += y * wt;
        self.n_contrib += 1;
    }

    fn n_contrib(&self) -> usize {
        self.n_contrib
    }

    fn value(&self) -> Option<f64> {
        if self.n_contrib == 0 {
            return None;
        }
        Some(self.limits.value_from_components(self.sum_x, self.sum_y))
    }
}
