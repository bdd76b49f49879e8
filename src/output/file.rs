//! File-backed record sink
//!
//! The file is opened in append mode so repeated runs accumulate results.
//! Each record is flushed as soon as it is written, so an interrupted crawl
//! keeps everything completed so far.

use crate::output::{CrawlRecord, OutputError, OutputResult, RecordSink};
use serde::Deserialize;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

const CSV_HEADER: &str = "\"URL\",\"Title\",\"Description\"";

/// Record encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum OutputFormat {
    /// Quoted CSV with a header row
    #[default]
    #[serde(rename = "csv")]
    Csv,

    /// One JSON object per line
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "jsonl" | "json-lines" | "ndjson" => Ok(Self::JsonLines),
            other => Err(format!("unknown output format '{}' (expected csv or jsonl)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::JsonLines => write!(f, "jsonl"),
        }
    }
}

/// Appends records to a file, one writer at a time
pub struct FileSink {
    path: PathBuf,
    format: OutputFormat,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    /// Opens (or creates) `path` for appending
    ///
    /// For CSV output the header row is written when the file is empty.
    pub fn open(path: impl AsRef<Path>, format: OutputFormat) -> OutputResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = BufWriter::new(file);
        if format == OutputFormat::Csv && is_empty {
            writeln!(writer, "{}", CSV_HEADER)?;
            writer.flush()?;
        }

        tracing::debug!("Opened {} output at {}", format, path.display());

        Ok(Self {
            path,
            format,
            writer: Mutex::new(Some(writer)),
        })
    }
}

impl RecordSink for FileSink {
    fn write_record(&self, record: &CrawlRecord) -> OutputResult<()> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let writer = guard.as_mut().ok_or(OutputError::Closed)?;

        match self.format {
            OutputFormat::Csv => {
                writeln!(
                    writer,
                    "{},{},{}",
                    escape_csv_field(&record.url),
                    escape_csv_field(&record.title),
                    escape_csv_field(&record.description)
                )?;
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut *writer, record)?;
                writer.write_all(b"\n")?;
            }
        }

        writer.flush()?;
        Ok(())
    }

    fn close(&self) -> OutputResult<()> {
        let mut guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(mut writer) = guard.take() {
            writer.flush()?;
            tracing::debug!("Closed output at {}", self.path.display());
        }
        Ok(())
    }
}

/// Wraps a field in double quotes, doubling any quotes inside it
fn escape_csv_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
