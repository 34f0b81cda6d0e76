//! Page session abstraction shared by the browser and HTTP backends.

use async_trait::async_trait;

use crate::error::{RowParseError, ScrapeError};
use crate::portal::RawRow;

/// Result of loading a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub final_url: String,
    /// HTTP status when the backend can observe it (CDP navigation cannot).
    pub status: Option<u16>,
}

impl Navigation {
    pub fn is_success(&self) -> bool {
        self.status.map_or(true, |s| (200..300).contains(&s))
    }
}

/// One row read from the results table, or the reason it could not be read.
pub type RowRead = Result<RawRow, RowParseError>;

/// A single page context driven by the extraction engine.
///
/// A session is owned by exactly one scrape call and must not be shared
/// between concurrent navigations.
#[async_trait]
pub trait PageSession: Send {
    /// Load a URL and wait for it to finish loading.
    async fn navigate(&mut self, url: &str) -> Result<Navigation, ScrapeError>;

    /// Whether any element matches the selector on the current page.
    async fn exists(&mut self, selector: &str) -> Result<bool, ScrapeError>;

    /// Replace the value of the first matching input with `text`.
    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), ScrapeError>;

    /// Set the form field called `name` on the current page. Returns false
    /// when the page has no such field.
    async fn set_field(&mut self, name: &str, value: &str) -> Result<bool, ScrapeError>;

    /// Activate the first matching control and report the page it led to.
    async fn click(&mut self, selector: &str) -> Result<Navigation, ScrapeError>;

    /// Rows of the first table matching `table_selector`, or `None` when the
    /// page has no such table.
    async fn table_rows(&mut self, table_selector: &str)
        -> Result<Option<Vec<RowRead>>, ScrapeError>;

    /// Release the session. Called exactly once per scrape call.
    async fn close(&mut self) -> Result<(), ScrapeError>;
}

/// Opens a fresh session for each scrape call.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError>;
}
