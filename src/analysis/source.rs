use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::trace;

use crate::analysis::config::{AnalysisConfig, ColumnLayout};
use crate::analysis::AnalysisError;

/// Identifies one sampling occasion (the raw date column of the log).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObservationKey(pub String);
impl From<&str> for ObservationKey {
    fn from(value: &str) -> Self {
        ObservationKey(value.to_owned())
    }
}

/// A single irradiance reading for one wavelength interval.
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub observation: ObservationKey,
    pub min_wavelength: f64,
    pub max_wavelength: f64,
    pub irradiance: f64,
}
impl Measurement {
    pub fn new(
        observation: impl Into<ObservationKey>,
        min_wavelength: f64,
        max_wavelength: f64,
        irradiance: f64,
    ) -> Self {
        Self {
            observation: observation.into(),
            min_wavelength,
            max_wavelength,
            irradiance,
        }
    }
}

/// Trait representing something that can yield measurements in arrival order.
pub trait MeasurementSource {
    fn next_measurement(&mut self) -> Result<Option<Measurement>, AnalysisError>;
}

/// In-memory source useful for tests and deterministic playback.
pub struct ManualSource {
    queue: VecDeque<Measurement>,
}
impl ManualSource {
    pub fn new(measurements: impl IntoIterator<Item = Measurement>) -> Self {
        Self {
            queue: measurements.into_iter().collect(),
        }
    }
}
impl MeasurementSource for ManualSource {
    fn next_measurement(&mut self) -> Result<Option<Measurement>, AnalysisError> {
        Ok(self.queue.pop_front())
    }
}

/// Reads the whitespace-delimited, fixed-column measurement log.
///
/// Comment lines and records with the wrong field count are skipped. A field
/// that fails to parse as a float aborts the read.
pub struct TextLogSource<R: BufRead> {
    reader: R,
    comment_marker: String,
    columns: ColumnLayout,
    line_number: usize,
    line: String,
}
impl TextLogSource<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| AnalysisError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufReader::new(file), config)
    }
}
impl<R: BufRead> TextLogSource<R> {
    pub fn new(reader: R, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        Ok(Self {
            reader,
            comment_marker: config.comment_marker.clone(),
            columns: config.columns.clone(),
            line_number: 0,
            line: String::new(),
        })
    }
    fn parse_record(&self, fields: &[&str]) -> Result<Measurement, AnalysisError> {
        Ok(Measurement {
            observation: ObservationKey::from(fields[self.columns.observation]),
            min_wavelength: self.parse_field(fields, self.columns.min_wavelength)?,
            max_wavelength: self.parse_field(fields, self.columns.max_wavelength)?,
            irradiance: self.parse_field(fields, self.columns.irradiance)?,
        })
    }
    fn parse_field(&self, fields: &[&str], column: usize) -> Result<f64, AnalysisError> {
        let raw = fields[column];
        raw.parse::<f64>().map_err(|_| AnalysisError::Parse {
            line: self.line_number,
            column,
            value: raw.to_owned(),
        })
    }
}
impl<R: BufRead> MeasurementSource for TextLogSource<R> {
    fn next_measurement(&mut self) -> Result<Option<Measurement>, AnalysisError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if self.line.starts_with(self.comment_marker.as_str()) {
                continue;
            }
            let fields: Vec<&str> = self.line.split_whitespace().collect();
            if fields.len() != self.columns.column_count {
                trace!(
                    "skipping line {}: {} fields, expected {}",
                    self.line_number,
                    fields.len(),
                    self.columns.column_count
                );
                continue;
            }
            return self.parse_record(&fields).map(Some);
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const LOG: &str = "\
; SORCE L3 combined, c24h
; nominal_date_yyyymmdd  nominal_date_jdn  min_wavelength  max_wavelength  ...
20030225.5  2452696.0  0.0  1.0  31  24  1.5e-05  2.0e-07  0
20030225.5  2452696.0  1.0  2.0  31  24  2.5e-05  2.0e-07  0
short line
20030226.5  2452697.0  0.0  1.0  31  24  1.7e-05  2.0e-07  0
";

    fn drain<S: MeasurementSource>(mut source: S) -> Result<Vec<Measurement>, AnalysisError> {
        let mut out = Vec::new();
        while let Some(m) = source.next_measurement()? {
            out.push(m);
        }
        Ok(out)
    }
    #[test]
    fn skips_comments_and_malformed_records() {
        let source = TextLogSource::new(Cursor::new(LOG), &AnalysisConfig::default()).unwrap();
        let measurements = drain(source).unwrap();
        assert_eq!(measurements.len(), 3);
        assert_eq!(measurements[0].observation, ObservationKey::from("20030225.5"));
        assert_eq!(measurements[1].min_wavelength, 1.0);
        assert_eq!(measurements[1].max_wavelength, 2.0);
        assert!((measurements[2].irradiance - 1.7e-05).abs() < 1e-18);
    }
    #[test]
    fn unparsable_number_is_fatal() {
        let log = "; header\n20030225.5 2452696.0 0.0 1.0 31 24 oops 2.0e-07 0\n";
        let source = TextLogSource::new(Cursor::new(log), &AnalysisConfig::default()).unwrap();
        let err = drain(source).unwrap_err();
        match err {
            AnalysisError::Parse {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 2);
                assert_eq!(column, 6);
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
    #[test]
    fn custom_comment_marker() {
        let config = AnalysisConfig {
            comment_marker: "#".into(),
            ..AnalysisConfig::default()
        };
        let log = "# a b c d e f g h i\nd1 0 0.0 1.0 0 0 3.0 0 0\n";
        let measurements = drain(TextLogSource::new(Cursor::new(log), &config).unwrap()).unwrap();
        assert_eq!(measurements.len(), 1);
        assert_eq!(measurements[0].irradiance, 3.0);
    }
    #[test]
    fn missing_file_reports_path() {
        let err = TextLogSource::open("/nonexistent/sorce.txt", &AnalysisConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, AnalysisError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/sorce.txt"));
    }
    #[test]
    fn manual_source_preserves_order() {
        let source = ManualSource::new(vec![
            Measurement::new("a", 0.0, 1.0, 1.0),
            Measurement::new("b", 0.0, 1.0, 2.0),
        ]);
        let measurements = drain(source).unwrap();
        assert_eq!(measurements[0].irradiance, 1.0);
        assert_eq!(measurements[1].observation, ObservationKey::from("b"));
    }
}
