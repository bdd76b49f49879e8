use crate::output::{CrawlRecord, OutputError, OutputResult, RecordSink};
use std::sync::{Mutex, PoisonError};

/// Record sink that keeps everything in memory
///
/// Handy when embedding the crawler as a library and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CrawlRecord>>,
    closed: Mutex<bool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of every record written so far, in write order
    pub fn records(&self) -> Vec<CrawlRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordSink for MemorySink {
    fn write_record(&self, record: &CrawlRecord) -> OutputResult<()> {
        if self.is_closed() {
            return Err(OutputError::Closed);
        }
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn close(&self) -> OutputResult<()> {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
        Ok(())
    }
}
