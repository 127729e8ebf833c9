use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analysis::error::AnalysisError;
use crate::analysis::plot::MAX_PLOT_DIMENSION;
use crate::analysis::rank::RankOrder;

/// How measurements are grouped into wavelength bins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinKeyMode {
    /// One bin per (min, max) wavelength interval.
    #[default]
    Interval,
    /// Coarser grouping: one bin per minimum wavelength.
    MinWavelength,
}

/// Column positions of the whitespace-delimited measurement log.
///
/// Defaults follow the SORCE L3 combined daily layout:
/// `date jdn min_wl max_wl mode_id version irradiance uncertainty quality`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    /// Records with any other field count are skipped.
    pub column_count: usize,
    pub observation: usize,
    pub min_wavelength: usize,
    pub max_wavelength: usize,
    pub irradiance: usize,
}
impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            column_count: 9,
            observation: 0,
            min_wavelength: 2,
            max_wavelength: 3,
            irradiance: 6,
        }
    }
}
impl ColumnLayout {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let columns = [
            ("observation", self.observation),
            ("min_wavelength", self.min_wavelength),
            ("max_wavelength", self.max_wavelength),
            ("irradiance", self.irradiance),
        ];
        for (name, index) in columns {
            if index >= self.column_count {
                return Err(AnalysisError::Config(format!(
                    "{name} column {index} is outside a {}-column record",
                    self.column_count
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub comment_marker: String,
    pub columns: ColumnLayout,
    pub bin_key: BinKeyMode,
    pub rank_order: RankOrder,
    pub render_plots: bool,
    pub plot_width: u32,
    pub plot_height: u32,
}
impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            comment_marker: ";".to_owned(),
            columns: ColumnLayout::default(),
            bin_key: BinKeyMode::default(),
            rank_order: RankOrder::default(),
            render_plots: true,
            // 8in x 8in at 96 dpi
            plot_width: 768,
            plot_height: 768,
        }
    }
}
impl AnalysisConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| AnalysisError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| AnalysisError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.comment_marker.is_empty() {
            return Err(AnalysisError::Config(
                "comment marker must not be empty".into(),
            ));
        }
        let dimensions = 1..=MAX_PLOT_DIMENSION;
        if !dimensions.contains(&self.plot_width) || !dimensions.contains(&self.plot_height) {
            return Err(AnalysisError::Config(format!(
                "plot dimensions {}x{} must be within 1..={MAX_PLOT_DIMENSION}",
                self.plot_width, self.plot_height
            )));
        }
        self.columns.validate()
    }
}
