use std::collections::BTreeMap;

use rustfft::{num_complex::Complex64, FftPlanner};
use serde::Serialize;

use crate::analysis::series::{BinKey, BinnedSeries};

/// Magnitude of every DFT coefficient of one bin's series; index = frequency bin.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpectralProfile {
    pub magnitudes: Vec<f64>,
}
impl SpectralProfile {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// Computes raw (unnormalized, unwindowed) magnitude spectra.
///
/// Plans are cached by the planner, so reusing one analyzer across bins of
/// equal length only plans once. Lengths need not be powers of two.
pub struct SpectralAnalyzer {
    planner: FftPlanner<f64>,
}
impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
impl SpectralAnalyzer {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }
    pub fn analyze(&mut self, series: &[f64]) -> SpectralProfile {
        if series.is_empty() {
            return SpectralProfile {
                magnitudes: Vec::new(),
            };
        }
        let fft = self.planner.plan_fft_forward(series.len());
        let mut buffer: Vec<Complex64> = series
            .iter()
            .map(|&v| Complex64::new(v, 0.0))
            .collect();
        fft.process(&mut buffer);
        SpectralProfile {
            magnitudes: buffer.iter().map(|c| c.norm()).collect(),
        }
    }
    pub fn analyze_all(&mut self, binned: &BinnedSeries) -> BTreeMap<BinKey, SpectralProfile> {
        binned
            .iter()
            .map(|(key, bin)| (*key, self.analyze(&bin.series)))
            .collect()
    }
}
