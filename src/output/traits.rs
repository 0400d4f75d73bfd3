//! Output sink traits and errors
//!
//! A sink receives the aggregated records of a crawl in page order and
//! persists them for the downstream cleaning/export step.

use crate::crawler::ListingRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for record sinks
///
/// Records are written exactly as extracted; sinks never transform fields.
pub trait RecordSink {
    /// Writes one record
    fn write_record(&mut self, record: &ListingRecord) -> OutputResult<()>;

    /// Flushes buffered output
    fn finish(&mut self) -> OutputResult<()>;

    /// Writes every record of an iterator, returning how many were written
    fn write_all<'a, I>(&mut self, records: I) -> OutputResult<usize>
    where
        I: IntoIterator<Item = &'a ListingRecord>,
        Self: Sized,
    {
        let mut written = 0;
        for record in records {
            self.write_record(record)?;
            written += 1;
        }
        Ok(written)
    }
}

/// Collects records in memory; handy for embedding and tests
#[derive(Debug, Default)]
pub struct VecSink {
    pub records: Vec<ListingRecord>,
}

impl RecordSink for VecSink {
    fn write_record(&mut self, record: &ListingRecord) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        Ok(())
    }
}
