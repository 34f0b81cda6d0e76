//! Result payload of one scrape call.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CaseRecord;

/// A judgment PDF saved to disk during a scrape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedPdf {
    pub pdf_id: String,
    pub path: PathBuf,
    pub size: u64,
    /// Hex-encoded SHA-256 of the file contents.
    pub sha256: String,
}

/// Outcome of a scrape, returned to callers whether or not it succeeded.
///
/// `success = false` always carries an `error`, and `cases` holds whatever
/// rows were collected before the failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeOutcome {
    pub success: bool,
    pub query: String,
    /// Legacy alias of `query`.
    pub company_name: Option<String>,
    pub filters_applied: BTreeMap<String, Option<String>>,
    pub total_cases: usize,
    pub total_pages_scraped: u32,
    pub cases: Vec<CaseRecord>,
    pub scraped_at: DateTime<Utc>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DownloadedPdf>,
}

impl ScrapeOutcome {
    /// A failed outcome with no rows, for errors raised before any page was loaded.
    pub fn failed(
        query: &str,
        filters_applied: BTreeMap<String, Option<String>>,
        error: impl ToString,
    ) -> Self {
        Self {
            success: false,
            query: query.to_string(),
            company_name: Some(query.to_string()),
            filters_applied,
            total_cases: 0,
            total_pages_scraped: 0,
            cases: Vec::new(),
            scraped_at: Utc::now(),
            error: Some(error.to_string()),
            documents: Vec::new(),
        }
    }
}
