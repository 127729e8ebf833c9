use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::analysis::error::AnalysisError;
use crate::analysis::pipeline::AnalysisReport;
use crate::analysis::plot::{
    render_average_rank_png, render_bin_means_png, render_mean_spectrum_png, render_profile_png,
    PlotStyle,
};
use crate::analysis::rank::{FrequencyScore, RankOrder};
use crate::analysis::series::BinKey;

#[derive(Clone, Debug, Serialize)]
pub struct BinSummary {
    pub key: BinKey,
    pub min_wavelength: f64,
    pub max_wavelength: f64,
    pub observation_count: usize,
    pub series_length: usize,
    pub mean_irradiance: f64,
}

/// Serializable digest of a run, written as `summary.json`.
#[derive(Clone, Debug, Serialize)]
pub struct ReportSummary {
    pub total_occasions: usize,
    pub bins: Vec<BinSummary>,
    /// Ascending mean magnitude.
    pub mean_magnitude_ranking: Vec<FrequencyScore>,
    pub average_rank_order: RankOrder,
    pub average_rank_ranking: Vec<FrequencyScore>,
}
impl ReportSummary {
    pub fn from_report(report: &AnalysisReport, order: RankOrder) -> Self {
        let bins = report
            .series
            .iter()
            .map(|(key, bin)| BinSummary {
                key: *key,
                min_wavelength: bin.min_wavelength,
                max_wavelength: bin.max_wavelength,
                observation_count: bin.observation_count,
                series_length: bin.series.len(),
                mean_irradiance: bin.mean_irradiance(),
            })
            .collect();
        Self {
            total_occasions: report.series.total_occasions,
            bins,
            mean_magnitude_ranking: report.aggregate.by_mean_magnitude(),
            average_rank_order: order,
            average_rank_ranking: report.aggregate.by_average_rank(order),
        }
    }
    /// `<frequency> <value>` lines: mean magnitudes, then average ranks.
    pub fn write_rankings<W: Write>(&self, out: &mut W) -> Result<(), AnalysisError> {
        for score in self
            .mean_magnitude_ranking
            .iter()
            .chain(&self.average_rank_ranking)
        {
            writeln!(out, "{} {}", score.frequency, score.value)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct ArtifactOptions {
    pub render_plots: bool,
    pub style: PlotStyle,
}

/// Writes `summary` and, when enabled, every chart under `out_dir`.
///
/// All charts are rendered before anything touches the disk, so a render
/// failure leaves `out_dir` as it was.
pub fn write_artifacts(
    report: &AnalysisReport,
    summary: &ReportSummary,
    out_dir: &Path,
    options: &ArtifactOptions,
) -> Result<Vec<PathBuf>, AnalysisError> {
    let plots_dir = out_dir.join("plots");
    let mut pending: Vec<(PathBuf, Vec<u8>)> = Vec::new();
    if options.render_plots {
        let style = &options.style;
        pending.push((
            out_dir.join("spectrum.png"),
            render_bin_means_png(&report.series, style)?,
        ));
        let mut stems = HashSet::new();
        for (key, profile) in &report.profiles {
            let stem = key.file_stem();
            if !stems.insert(stem.clone()) {
                return Err(AnalysisError::Plot(format!(
                    "bins {key} share the plot name frequency_{stem}.png"
                )));
            }
            pending.push((
                plots_dir.join(format!("frequency_{stem}.png")),
                render_profile_png(key, profile, style)?,
            ));
        }
        pending.push((
            out_dir.join("frequency.png"),
            render_mean_spectrum_png(&report.aggregate, style)?,
        ));
        pending.push((
            out_dir.join("average_rank.png"),
            render_average_rank_png(&report.aggregate, style)?,
        ));
    }
    pending.push((
        out_dir.join("summary.json"),
        serde_json::to_vec_pretty(summary)?,
    ));
    fs::create_dir_all(out_dir)?;
    if options.render_plots {
        fs::create_dir_all(&plots_dir)?;
    }
    let mut written = Vec::with_capacity(pending.len());
    for (path, bytes) in pending {
        fs::write(&path, bytes)?;
        written.push(path);
    }
    info!("wrote {} artifacts to {}", written.len(), out_dir.display());
    Ok(written)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::config::BinKeyMode;
    use crate::analysis::pipeline::SpectrumPipeline;
    use crate::analysis::source::{ManualSource, Measurement};

    fn report() -> AnalysisReport {
        let measurements = vec![
            Measurement::new("d1", 0.0, 1.0, 1.0),
            Measurement::new("d1", 1.0, 2.0, 2.0),
            Measurement::new("d2", 0.0, 1.0, 3.0),
            Measurement::new("d3", 1.0, 2.0, 5.0),
        ];
        SpectrumPipeline::new(ManualSource::new(measurements), BinKeyMode::Interval)
            .run()
            .unwrap()
    }
    fn summary(report: &AnalysisReport) -> ReportSummary {
        ReportSummary::from_report(report, RankOrder::Descending)
    }
    fn options(render_plots: bool) -> ArtifactOptions {
        ArtifactOptions {
            render_plots,
            style: PlotStyle {
                width: 100,
                height: 80,
                annotate: false,
                ..PlotStyle::default()
            },
        }
    }
    #[test]
    fn summary_describes_bins_and_rankings() {
        let summary = ReportSummary::from_report(&report(), RankOrder::Ascending);
        assert_eq!(summary.total_occasions, 3);
        assert_eq!(summary.bins.len(), 2);
        assert_eq!(summary.bins[0].observation_count, 2);
        assert_eq!(summary.bins[0].series_length, 3);
        assert!((summary.bins[1].mean_irradiance - 3.5).abs() < 1e-12);
        assert_eq!(summary.mean_magnitude_ranking.len(), 3);
        assert_eq!(summary.average_rank_ranking.len(), 3);
        let ranks: Vec<f64> = summary.average_rank_ranking.iter().map(|s| s.value).collect();
        assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
    }
    #[test]
    fn rankings_print_one_line_per_frequency() {
        let summary = ReportSummary::from_report(&report(), RankOrder::Descending);
        let mut out = Vec::new();
        summary.write_rankings(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 6);
        assert!(text.lines().all(|l| l.split(' ').count() == 2));
    }
    #[test]
    fn summary_only_without_plots() {
        let dir = tempfile::tempdir().unwrap();
        let report = report();
        let written =
            write_artifacts(&report, &summary(&report), dir.path(), &options(false)).unwrap();
        assert_eq!(written, vec![dir.path().join("summary.json")]);
        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(&written[0]).unwrap()).unwrap();
        assert_eq!(json["total_occasions"], 3);
        assert_eq!(json["average_rank_order"], "descending");
        assert_eq!(json["bins"][0]["key"]["max_wavelength"], 1.0);
    }
    #[test]
    fn plots_land_next_to_summary() {
        let dir = tempfile::tempdir().unwrap();
        let report = report();
        let written =
            write_artifacts(&report, &summary(&report), dir.path(), &options(true)).unwrap();
        // spectrum, two bins, mean spectrum, average rank, summary
        assert_eq!(written.len(), 6);
        assert!(dir.path().join("plots").join("frequency_0_1.png").is_file());
        assert!(dir.path().join("average_rank.png").is_file());
        assert!(written.iter().all(|p| p.is_file()));
    }
    #[test]
    fn nearly_equal_bins_get_their_own_plot() {
        let measurements = vec![
            Measurement::new("d1", 1e-7, 1.0, 1.0),
            Measurement::new("d1", 2e-7, 1.0, 2.0),
            Measurement::new("d2", 1e-7, 1.0, 3.0),
        ];
        let report = SpectrumPipeline::new(ManualSource::new(measurements), BinKeyMode::Interval)
            .run()
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let written =
            write_artifacts(&report, &summary(&report), dir.path(), &options(true)).unwrap();
        let per_bin: Vec<&PathBuf> = written
            .iter()
            .filter(|p| p.starts_with(dir.path().join("plots")))
            .collect();
        assert_eq!(per_bin.len(), 2);
        assert_ne!(per_bin[0], per_bin[1]);
        assert_eq!(fs::read_dir(dir.path().join("plots")).unwrap().count(), 2);
    }
    #[test]
    fn failed_render_writes_nothing() {
        let report = report();
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        let mut opts = options(true);
        opts.style.width = 40_000;
        let err = write_artifacts(&report, &summary(&report), &out_dir, &opts).unwrap_err();
        assert!(matches!(err, AnalysisError::Plot(_)));
        assert!(!out_dir.exists());
    }
}
