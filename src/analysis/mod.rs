// src/analysis/mod.rs
// measurement log -> per-bin series -> magnitude spectra -> cross-bin ranking
pub mod config;
pub mod error;
pub mod fft;
pub mod pipeline;
pub mod plot;
pub mod rank;
pub mod report;
pub mod series;
pub mod source;
pub use config::{AnalysisConfig, BinKeyMode};
pub use error::AnalysisError;
pub use pipeline::SpectrumPipeline;
pub use plot::PlotStyle;
pub use rank::RankOrder;
pub use report::{write_artifacts, ArtifactOptions, ReportSummary};
pub use source::TextLogSource;
