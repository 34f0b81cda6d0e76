//! Litigation search service.
//!
//! Validates incoming requests, runs one extraction per call and optionally
//! fetches the referenced judgment PDFs. Shared by the CLI and the web server.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Settings;
use crate::error::ValidationError;
use crate::models::{FilterSet, ScrapeOutcome, ScrapeRequest};
use crate::scrapers::{EngineOptions, ExtractionEngine, PdfDownloader, SessionProvider};

/// Service for court litigation searches.
pub struct LitigationService {
    engine: ExtractionEngine,
    downloader: Option<PdfDownloader>,
    min_query_len: usize,
}

impl LitigationService {
    pub fn new(
        provider: Arc<dyn SessionProvider>,
        options: EngineOptions,
        min_query_len: usize,
    ) -> Self {
        Self {
            engine: ExtractionEngine::new(provider, options),
            downloader: None,
            min_query_len,
        }
    }

    /// Build from settings with the configured session backend.
    pub fn from_settings(settings: &Settings) -> Self {
        let downloader = match PdfDownloader::new(
            &settings.pdf_dir,
            settings.user_agent.as_deref(),
            settings.navigation_timeout(),
        ) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("PDF downloads disabled: {}", e);
                None
            }
        };

        Self {
            engine: ExtractionEngine::new(settings.session_provider(), settings.engine_options()),
            downloader,
            min_query_len: settings.min_query_len,
        }
    }

    pub fn with_downloader(mut self, downloader: PdfDownloader) -> Self {
        self.downloader = Some(downloader);
        self
    }

    pub fn min_query_len(&self) -> usize {
        self.min_query_len
    }

    /// Validate a caller request and run it. Only validation failures are
    /// errors; everything past validation is reported in the outcome.
    pub async fn search(&self, request: ScrapeRequest) -> Result<ScrapeOutcome, ValidationError> {
        let filters = request.into_filters(self.min_query_len)?;
        Ok(self.scrape(&filters).await)
    }

    /// Run an already validated filter set.
    pub async fn scrape(&self, filters: &FilterSet) -> ScrapeOutcome {
        if filters.convert_to_markdown() {
            info!("Markdown conversion requested but not supported; returning raw records");
        }

        let mut outcome = self.engine.scrape(filters).await;

        if filters.download_pdfs() && !outcome.cases.is_empty() {
            match &self.downloader {
                Some(downloader) => {
                    outcome.documents = downloader.download_all(&outcome.cases).await;
                }
                None => warn!("PDF download requested but no downloader is configured"),
            }
        }

        outcome
    }
}
