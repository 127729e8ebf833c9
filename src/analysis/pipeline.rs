use std::collections::BTreeMap;

use log::{debug, info};

use crate::analysis::config::BinKeyMode;
use crate::analysis::error::AnalysisError;
use crate::analysis::fft::{SpectralAnalyzer, SpectralProfile};
use crate::analysis::rank::{CrossBinAggregate, RankAggregator};
use crate::analysis::series::{BinKey, BinnedSeries, SeriesBuilder};
use crate::analysis::source::MeasurementSource;

/// Everything produced by one run of the pipeline.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    pub series: BinnedSeries,
    pub profiles: BTreeMap<BinKey, SpectralProfile>,
    pub aggregate: CrossBinAggregate,
}

/// Drives measurements through series building, spectral analysis and rank aggregation.
pub struct SpectrumPipeline<S: MeasurementSource> {
    source: S,
    builder: SeriesBuilder,
    ingested: usize,
}
impl<S: MeasurementSource> SpectrumPipeline<S> {
    pub fn new(source: S, mode: BinKeyMode) -> Self {
        Self {
            source,
            builder: SeriesBuilder::new(mode),
            ingested: 0,
        }
    }
    /// Ingests the next measurement; `false` once the source is drained.
    pub fn pump_once(&mut self) -> Result<bool, AnalysisError> {
        let Some(measurement) = self.source.next_measurement()? else {
            return Ok(false);
        };
        self.builder.ingest(&measurement);
        self.ingested += 1;
        Ok(true)
    }
    pub fn ingested(&self) -> usize {
        self.ingested
    }
    pub fn run(mut self) -> Result<AnalysisReport, AnalysisError> {
        while self.pump_once()? {}
        if self.ingested == 0 {
            return Err(AnalysisError::EmptyInput);
        }
        let series = self.builder.finalize();
        info!(
            "ingested {} measurements into {} bins over {} occasions",
            self.ingested,
            series.len(),
            series.total_occasions
        );
        for (key, bin) in series.iter() {
            debug!("{key} {} {}", bin.observation_count, bin.series.len());
        }
        analyze(series)
    }
}

/// Spectral analysis and aggregation of already-finalized series.
pub fn analyze(series: BinnedSeries) -> Result<AnalysisReport, AnalysisError> {
    let profiles = SpectralAnalyzer::new().analyze_all(&series);
    let aggregate = RankAggregator::aggregate(&profiles)?;
    debug!(
        "aggregated {} frequencies across {} bins",
        aggregate.frequency_count(),
        aggregate.bin_count
    );
    Ok(AnalysisReport {
        series,
        profiles,
        aggregate,
    })
}
