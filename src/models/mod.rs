//! Data models for court case searches.

mod case;
mod filters;
mod outcome;

pub use case::{CaseRecord, ParseMode};
pub use filters::{
    CaseType, CourtInstance, FilterSet, ScrapeRequest, DEFAULT_MAX_PAGES, MAX_PAGES_LIMIT,
    MAX_QUERY_LEN,
};
pub use outcome::{DownloadedPdf, ScrapeOutcome};
