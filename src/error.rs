use std::{io, num::ParseIntError, path::PathBuf};

use quick_xml::events::attributes::AttrError;

/// The input could not be opened.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("File reading error. Please, check the path to file and restart application")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Malformed structure or numeric content in the input stream.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("{0}")]
    Attribute(#[from] AttrError),

    #[error("unexpected end of document: {open} element(s) left unclosed")]
    UnclosedDocument { open: usize },

    #[error("item element has {found} attribute(s), expected 4")]
    MissingAttribute { found: usize },

    #[error("invalid {field} value {value:?}: {source}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("thread pool is no longer accepting work")]
    Closed,
}

/// Failure of a single pool task. Never propagates to sibling tasks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task panicked: {0}")]
    Panicked(String),

    #[error("task result was lost before it could be reported")]
    Lost,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}
