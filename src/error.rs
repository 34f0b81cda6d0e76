//! Error types for request validation and portal extraction.

use std::fmt;

/// Which interactive page element was being located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    SearchInput,
    SubmitControl,
    /// A named search form field carrying a filter value.
    FilterField(&'static str),
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlKind::SearchInput => f.write_str("search input"),
            ControlKind::SubmitControl => f.write_str("submit control"),
            ControlKind::FilterField(name) => write!(f, "filter field '{}'", name),
        }
    }
}

/// A search request that cannot be turned into a filter set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("query text is required")]
    EmptyQuery,
    #[error("query text must be at least {min} characters")]
    QueryTooShort { min: usize },
    #[error("query text must be at most {max} characters")]
    QueryTooLong { max: usize },
    #[error("max_pages must be between 1 and 100 (got {value})")]
    MaxPagesOutOfRange { value: u32 },
    #[error("invalid ruling date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Failures surfaced by the extraction engine.
///
/// None of these are retried inside a scrape call.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to start session: {0}")]
    SessionInit(String),

    #[error("navigation to {url} timed out after {secs}s")]
    NavigationTimeout { url: String, secs: u64 },

    #[error("{0} not found on page")]
    ControlNotFound(ControlKind),

    #[error("unexpected page state: {0}")]
    UnexpectedPageState(String),

    #[error("scrape deadline of {secs}s exceeded")]
    DeadlineExceeded { secs: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Browser(e.to_string())
    }
}

/// A single result row that could not be read. Always recovered by skipping the row.
#[derive(Debug, Clone, thiserror::Error)]
#[error("row {index}: {reason}")]
pub struct RowParseError {
    pub index: usize,
    pub reason: String,
}
