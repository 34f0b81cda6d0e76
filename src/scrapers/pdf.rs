//! Judgment PDF downloads.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::identity::ClientIdentity;
use crate::error::ScrapeError;
use crate::models::{CaseRecord, DownloadedPdf};
use crate::portal::url_builder::PDF_BASE_URL;

/// Fetches judgment PDFs by id into a local directory.
#[derive(Debug, Clone)]
pub struct PdfDownloader {
    client: Client,
    dir: PathBuf,
    base_url: String,
}

impl PdfDownloader {
    pub fn new(
        dir: impl Into<PathBuf>,
        user_agent: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ScrapeError> {
        let identity = ClientIdentity::resolve(user_agent);
        let client = Client::builder()
            .user_agent(identity.user_agent.as_str())
            .default_headers(identity.default_headers())
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            dir: dir.into(),
            base_url: PDF_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download one PDF. Non-2xx responses are errors.
    pub async fn download(&self, pdf_id: &str) -> Result<DownloadedPdf, ScrapeError> {
        let url = format!("{}/{}", self.base_url, pdf_id);
        debug!("Downloading {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        save_pdf(&self.dir, pdf_id, &bytes).await
    }

    /// Download every distinct PDF referenced by `cases`, in case order.
    /// Failures are logged and skipped.
    pub async fn download_all(&self, cases: &[CaseRecord]) -> Vec<DownloadedPdf> {
        let mut seen = HashSet::new();
        let mut saved = Vec::new();

        for id in cases.iter().filter_map(|c| c.pdf_id.as_deref()) {
            if !seen.insert(id) {
                continue;
            }
            match self.download(id).await {
                Ok(pdf) => saved.push(pdf),
                Err(e) => warn!("Failed to download PDF {}: {}", id, e),
            }
        }

        info!("Downloaded {} of {} PDFs", saved.len(), seen.len());
        saved
    }
}

/// File name for a PDF id. Anything outside `[A-Za-z0-9_-]` becomes `_`.
pub fn pdf_file_name(pdf_id: &str) -> String {
    let stem: String = pdf_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        "document.pdf".to_string()
    } else {
        format!("{}.pdf", stem)
    }
}

/// Write `bytes` as `<dir>/<id>.pdf` and record its SHA-256.
pub async fn save_pdf(dir: &Path, pdf_id: &str, bytes: &[u8]) -> Result<DownloadedPdf, ScrapeError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(pdf_file_name(pdf_id));
    tokio::fs::write(&path, bytes).await?;

    let mut hasher = Sha256::new();
    hasher.update(bytes);

    Ok(DownloadedPdf {
        pdf_id: pdf_id.to_string(),
        path,
        size: bytes.len() as u64,
        sha256: hex::encode(hasher.finalize()),
    })
}
