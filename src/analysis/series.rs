use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::analysis::config::BinKeyMode;
use crate::analysis::source::{Measurement, ObservationKey};

/// Wavelength-bin identity. `max_wavelength` is `None` when bins are keyed
/// on the minimum wavelength alone.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct BinKey {
    pub min_wavelength: f64,
    pub max_wavelength: Option<f64>,
}
impl BinKey {
    pub fn interval(min_wavelength: f64, max_wavelength: f64) -> Self {
        Self {
            min_wavelength,
            max_wavelength: Some(max_wavelength),
        }
    }
    pub fn min_only(min_wavelength: f64) -> Self {
        Self {
            min_wavelength,
            max_wavelength: None,
        }
    }
    pub fn for_measurement(measurement: &Measurement, mode: BinKeyMode) -> Self {
        match mode {
            BinKeyMode::Interval => {
                Self::interval(measurement.min_wavelength, measurement.max_wavelength)
            }
            BinKeyMode::MinWavelength => Self::min_only(measurement.min_wavelength),
        }
    }
    /// File-name form of the key. Uses the shortest round-trip float text, so
    /// distinct keys never share a stem.
    pub fn file_stem(&self) -> String {
        match self.max_wavelength {
            Some(max) => format!("{}_{}", self.min_wavelength, max),
            None => format!("{}", self.min_wavelength),
        }
    }
}
impl PartialEq for BinKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for BinKey {}
impl PartialOrd for BinKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for BinKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.min_wavelength
            .total_cmp(&other.min_wavelength)
            .then_with(|| match (self.max_wavelength, other.max_wavelength) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                (a, b) => a.is_some().cmp(&b.is_some()),
            })
    }
}
impl fmt::Display for BinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_wavelength {
            Some(max) => write!(f, "{:.6}-{:.6}", self.min_wavelength, max),
            None => write!(f, "{:.6}", self.min_wavelength),
        }
    }
}

/// Accumulated state for one wavelength bin.
#[derive(Clone, Debug)]
pub struct WavelengthBin {
    pub key: BinKey,
    /// Interval of the first measurement that created the bin.
    pub min_wavelength: f64,
    pub max_wavelength: f64,
    pub sum: f64,
    pub observation_count: usize,
    pub series: Vec<f64>,
}
impl WavelengthBin {
    fn new(key: BinKey, measurement: &Measurement) -> Self {
        Self {
            key,
            min_wavelength: measurement.min_wavelength,
            max_wavelength: measurement.max_wavelength,
            sum: 0.0,
            observation_count: 0,
            series: Vec::new(),
        }
    }
    pub fn mean_irradiance(&self) -> f64 {
        if self.observation_count == 0 {
            return 0.0;
        }
        self.sum / self.observation_count as f64
    }
    /// Catch-up fill: every occasion missed since this bin was last seen is
    /// filled with the *incoming* value, not the previous one.
    fn catch_up(&mut self, total_occasions: usize, irradiance: f64) {
        if self.series.len() < total_occasions {
            self.series.resize(total_occasions, irradiance);
        }
    }
    /// Trailing forward-fill with the last recorded value.
    fn pad_trailing(&mut self, total_occasions: usize) {
        let Some(&last) = self.series.last() else {
            return;
        };
        if self.series.len() < total_occasions {
            self.series.resize(total_occasions, last);
        }
    }
}

/// Groups measurements into one equal-length series per wavelength bin.
pub struct SeriesBuilder {
    mode: BinKeyMode,
    bins: BTreeMap<BinKey, WavelengthBin>,
    total_occasions: usize,
    previous: Option<ObservationKey>,
}
impl SeriesBuilder {
    pub fn new(mode: BinKeyMode) -> Self {
        Self {
            mode,
            bins: BTreeMap::new(),
            total_occasions: 0,
            previous: None,
        }
    }
    pub fn total_occasions(&self) -> usize {
        self.total_occasions
    }
    pub fn ingest(&mut self, measurement: &Measurement) {
        // occasions are contiguous runs of one key, not distinct keys
        if self.previous.as_ref() != Some(&measurement.observation) {
            self.previous = Some(measurement.observation.clone());
            self.total_occasions += 1;
        }
        let key = BinKey::for_measurement(measurement, self.mode);
        let bin = self
            .bins
            .entry(key)
            .or_insert_with(|| WavelengthBin::new(key, measurement));
        bin.sum += measurement.irradiance;
        bin.observation_count += 1;
        bin.catch_up(self.total_occasions, measurement.irradiance);
    }
    pub fn finalize(mut self) -> BinnedSeries {
        let total_occasions = self.total_occasions;
        for bin in self.bins.values_mut() {
            bin.pad_trailing(total_occasions);
        }
        BinnedSeries {
            total_occasions,
            bins: self.bins,
        }
    }
}

/// Finalized output of [`SeriesBuilder`]: every series has `total_occasions` entries.
#[derive(Clone, Debug)]
pub struct BinnedSeries {
    pub total_occasions: usize,
    pub bins: BTreeMap<BinKey, WavelengthBin>,
}
impl BinnedSeries {
    pub fn len(&self) -> usize {
        self.bins.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
    pub fn get(&self, key: &BinKey) -> Option<&WavelengthBin> {
        self.bins.get(key)
    }
    pub fn iter(&self) -> impl Iterator<Item = (&BinKey, &WavelengthBin)> {
        self.bins.iter()
    }
}
