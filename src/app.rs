use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use tracing::{debug, error, warn};

use crate::{
    config::Config,
    error::{IngestError, ParseError, StartupError},
    ingest::{IngestSummary, Ingestor},
    record::RawItem,
    report::Report,
    source::XmlSource,
    statistic::{DuplicateCounter, FloorHistogram},
    thread_pool::{DrainOutcome, ThreadPool},
};

#[derive(Debug)]
pub struct Tally {
    pub report: Report,
    pub summary: IngestSummary,
    pub drain: DrainOutcome,
}

/// Counts `items` on `pool` and builds the report once the pool drains or
/// `timeout` passes. A timed-out drain still yields a report over whatever
/// has been counted so far.
pub fn tally<I>(items: I, mut pool: ThreadPool, timeout: Duration) -> Result<Tally, IngestError>
where
    I: IntoIterator<Item = Result<RawItem, ParseError>>,
{
    let duplicates = Arc::new(DuplicateCounter::new());
    let floors = Arc::new(FloorHistogram::new());

    let ingested =
        Ingestor::new(&pool, Arc::clone(&duplicates), Arc::clone(&floors)).ingest(items);
    let drain = pool.drain(timeout);
    let summary = ingested?;

    Ok(Tally {
        report: Report::generate(&duplicates, &floors),
        summary,
        drain,
    })
}

pub fn run(config: &Config, out: &mut impl Write) -> Result<(), AppError> {
    let source = XmlSource::open(&config.input)?;
    let pool = match config.workers {
        Some(workers) => ThreadPool::new(workers.into()),
        None => ThreadPool::with_available_parallelism(),
    };
    debug!(input = %config.input.display(), workers = pool.size(), "starting");

    writeln!(out, "Processing. Please, wait...")?;
    out.flush()?;

    let tally = tally(source, pool, config.drain_timeout())?;
    if !tally.drain.completed {
        warn!(
            pending = tally.drain.pending,
            "reporting before all counting tasks finished"
        );
    }
    write!(out, "{}", tally.report)?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

impl AppError {
    pub fn log(&self) {
        match self {
            AppError::Startup(StartupError::Open { path, source }) => {
                error!(path = %path.display(), %source, "cannot open input");
            }
            other => error!(error = %other, "processing aborted"),
        }
    }
}
