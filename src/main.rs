// src/main.rs
mod analysis;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use analysis::{
    write_artifacts, AnalysisConfig, ArtifactOptions, BinKeyMode, PlotStyle, RankOrder,
    ReportSummary, SpectrumPipeline, TextLogSource,
};

/// Find periodicities shared across wavelength bins of an irradiance log.
#[derive(Parser, Debug)]
#[command(name = "irradiance-spectrum", version)]
struct Cli {
    /// Whitespace-delimited measurement log (SORCE L3 combined layout by default)
    input: PathBuf,
    /// Directory for the rendered charts and summary.json
    #[arg(short, long, default_value = ".")]
    output: PathBuf,
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Key bins on the minimum wavelength only
    #[arg(long)]
    coarse_bins: bool,
    /// Presentation order of the average-rank profile
    #[arg(long, value_enum)]
    rank_order: Option<RankOrder>,
    /// Skip chart rendering, only write summary.json
    #[arg(long)]
    no_plots: bool,
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if cli.coarse_bins {
        config.bin_key = BinKeyMode::MinWavelength;
    }
    if let Some(order) = cli.rank_order {
        config.rank_order = order;
    }
    if cli.no_plots {
        config.render_plots = false;
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    let config = load_config(&cli)?;
    let source = TextLogSource::open(&cli.input, &config)?;
    let report = SpectrumPipeline::new(source, config.bin_key)
        .run()
        .with_context(|| format!("analyzing {}", cli.input.display()))?;
    let summary = ReportSummary::from_report(&report, config.rank_order);
    let options = ArtifactOptions {
        render_plots: config.render_plots,
        style: PlotStyle::sized(config.plot_width, config.plot_height),
    };
    let written = write_artifacts(&report, &summary, &cli.output, &options)
        .with_context(|| format!("writing artifacts to {}", cli.output.display()))?;
    info!("done: {} files", written.len());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    summary.write_rankings(&mut out)?;
    out.flush()?;
    Ok(())
}
