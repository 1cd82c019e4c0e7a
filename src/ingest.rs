use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{IngestError, ParseError, PoolError},
    record::{RawItem, Record},
    statistic::{DuplicateCounter, FloorHistogram},
    thread_pool::ThreadPool,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub records: usize,
}

/// Turns input elements into records and hands each one to both counters
/// through the pool.
pub struct Ingestor<'p> {
    pool: &'p ThreadPool,
    duplicates: Arc<DuplicateCounter>,
    floors: Arc<FloorHistogram>,
}

impl<'p> Ingestor<'p> {
    pub fn new(
        pool: &'p ThreadPool,
        duplicates: Arc<DuplicateCounter>,
        floors: Arc<FloorHistogram>,
    ) -> Self {
        Ingestor {
            pool,
            duplicates,
            floors,
        }
    }

    /// Stops at the first bad element. Work already submitted is left running.
    pub fn ingest<I>(&self, items: I) -> Result<IngestSummary, IngestError>
    where
        I: IntoIterator<Item = Result<RawItem, ParseError>>,
    {
        let mut summary = IngestSummary::default();
        for item in items {
            let record = Record::try_from(item?)?;
            self.dispatch(record)?;
            summary.records += 1;
        }
        debug!(records = summary.records, "ingestion finished");
        Ok(summary)
    }

    fn dispatch(&self, record: Record) -> Result<(), PoolError> {
        let city = record.city().to_owned();
        let floor = record.floor();

        let duplicates = Arc::clone(&self.duplicates);
        self.pool
            .execute(move || duplicates.record_occurrence(record))?;

        let floors = Arc::clone(&self.floors);
        self.pool.execute(move || floors.record_value(&city, floor))
    }
}
