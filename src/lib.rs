pub mod app;
pub mod config;
pub mod error;
pub mod ingest;
pub mod record;
pub mod report;
pub mod source;
pub mod statistic;
pub mod thread_pool;

pub use record::{RawItem, Record};
pub use report::Report;
pub use statistic::{DuplicateCounter, FloorHistogram};
pub use thread_pool::{DrainOutcome, TaskHandle, ThreadPool};
