//! Loading and writing of the `Priority,WaitTime` patient dataset.
//!
//! The dataset is a delimited text file with a header row.  Only the `Priority` and `WaitTime`
//! columns are required; any further columns are ignored.  Rows are validated while they are read
//! so that an empty priority or a non-numeric wait time surfaces as a [`ReportError`] pointing at
//! the offending line rather than as a skewed statistic further down the pipeline.

use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::{debug, info};
use serde::Deserialize;

use crate::error::{ReportError, Result};

/// Header of the categorical triage column.
pub const PRIORITY_FIELD: &str = "Priority";
/// Header of the numeric wait time column (minutes).
pub const WAIT_TIME_FIELD: &str = "WaitTime";

/// Triage level assigned to a patient on arrival.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Display order used by charts and the simulation queue.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Label written to and read from the dataset.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// Maps a dataset label back to a priority, if it is one of the known levels.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == label)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single row of the dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct PatientRecord {
    priority: String,
    wait_time: f64,
}

impl PatientRecord {
    /// Creates a record from a priority label and a wait time in minutes.
    pub fn new(priority: impl Into<String>, wait_time: f64) -> Self {
        Self {
            priority: priority.into(),
            wait_time,
        }
    }

    /// Priority label as found in the dataset.
    pub fn priority(&self) -> &str {
        &self.priority
    }

    /// Minutes between arrival and the start of service.
    pub fn wait_time(&self) -> f64 {
        self.wait_time
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Priority")]
    priority: String,
    #[serde(rename = "WaitTime")]
    wait_time: String,
}

impl RawRecord {
    fn validate(self, line: u64) -> Result<PatientRecord> {
        if self.priority.is_empty() {
            return Err(ReportError::InvalidRecord {
                line,
                reason: format!("empty {} value", PRIORITY_FIELD),
            });
        }

        let wait_time = self
            .wait_time
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| ReportError::InvalidRecord {
                line,
                reason: format!("{} '{}' is not a number", WAIT_TIME_FIELD, self.wait_time),
            })?;

        Ok(PatientRecord::new(self.priority, wait_time))
    }
}

fn require_field(headers: &StringRecord, field: &'static str, path: &Path) -> Result<()> {
    if headers.iter().any(|header| header == field) {
        Ok(())
    } else {
        Err(ReportError::MissingField {
            field,
            path: path.to_path_buf(),
        })
    }
}

/// Loads every record from the dataset at `path`.
///
/// Returns [`ReportError::MissingFile`] before touching the file system any further when the path
/// does not exist.
pub fn load_records(path: impl AsRef<Path>, delimiter: u8) -> Result<Vec<PatientRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ReportError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    let file = File::open(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_records(file, delimiter, path)?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parses records from any reader; `origin` is only used in error messages.
pub fn read_records<R: Read>(
    reader: R,
    delimiter: u8,
    origin: impl AsRef<Path>,
) -> Result<Vec<PatientRecord>> {
    let origin = origin.as_ref();
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    require_field(&headers, PRIORITY_FIELD, origin)?;
    require_field(&headers, WAIT_TIME_FIELD, origin)?;
    debug!("Dataset columns: {:?}", headers);

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let line = row.position().map_or(0, |position| position.line());
        let raw: RawRecord = row.deserialize(Some(&headers))?;
        records.push(raw.validate(line)?);
    }

    Ok(records)
}

fn format_minutes(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Writes records with the `Priority,WaitTime` header to any writer.
pub fn write_records<W: Write>(writer: W, records: &[PatientRecord], delimiter: u8) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    writer.write_record([PRIORITY_FIELD, WAIT_TIME_FIELD])?;
    for record in records {
        let minutes = format_minutes(record.wait_time());
        writer.write_record([record.priority(), minutes.as_str()])?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes the dataset to `path`, replacing any existing file.
pub fn save_records(
    path: impl AsRef<Path>,
    records: &[PatientRecord],
    delimiter: u8,
) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_records(file, records, delimiter)?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Vec<PatientRecord>> {
        read_records(input.as_bytes(), b',', "inline.csv")
    }

    #[test]
    fn reads_required_columns() {
        let records = parse("Priority,WaitTime\nHigh,5\nLow, 2.5\n").expect("parse succeeds");
        assert_eq!(
            records,
            vec![
                PatientRecord::new("High", 5.0),
                PatientRecord::new("Low", 2.5),
            ]
        );
    }

    #[test]
    fn ignores_extra_columns_and_order() {
        let records = parse("Id,WaitTime,Priority\n1,7,Medium\n").expect("parse succeeds");
        assert_eq!(records, vec![PatientRecord::new("Medium", 7.0)]);
    }

    #[test]
    fn header_only_yields_no_records() {
        let records = parse("Priority,WaitTime\n").expect("parse succeeds");
        assert!(records.is_empty());
    }

    #[test]
    fn missing_column_is_reported() {
        let err = parse("Priority,Minutes\nHigh,5\n").unwrap_err();
        assert!(matches!(
            err,
            ReportError::MissingField {
                field: WAIT_TIME_FIELD,
                ..
            }
        ));
    }

    #[test]
    fn non_numeric_wait_time_names_the_line() {
        let err = parse("Priority,WaitTime\nHigh,5\nLow,soon\n").unwrap_err();
        match err {
            ReportError::InvalidRecord { line, reason } => {
                assert_eq!(line, 3);
                assert!(reason.contains("soon"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_priority_is_rejected() {
        let err = parse("Priority,WaitTime\n,5\n").unwrap_err();
        assert!(matches!(err, ReportError::InvalidRecord { line: 2, .. }));
    }

    #[test]
    fn missing_file_is_reported_before_reading() {
        let err = load_records("/__sor_report_missing__/statystyki.csv", b',').unwrap_err();
        assert!(matches!(err, ReportError::MissingFile { .. }));
    }

    #[test]
    fn custom_delimiter() {
        let records = read_records("Priority;WaitTime\nHigh;3\n".as_bytes(), b';', "semi.csv")
            .expect("parse succeeds");
        assert_eq!(records, vec![PatientRecord::new("High", 3.0)]);
    }

    #[test]
    fn written_dataset_uses_integral_minutes() {
        let mut buffer = Vec::new();
        write_records(
            &mut buffer,
            &[
                PatientRecord::new("High", 4.0),
                PatientRecord::new("Low", 1.5),
            ],
            b',',
        )
        .expect("write succeeds");
        assert_eq!(
            String::from_utf8(buffer).expect("utf8"),
            "Priority,WaitTime\nHigh,4\nLow,1.5\n"
        );
    }

    #[test]
    fn priority_labels() {
        assert_eq!(Priority::from_label("Medium"), Some(Priority::Medium));
        assert_eq!(Priority::from_label("medium"), None);
        assert_eq!(Priority::High.to_string(), "High");
    }
}
