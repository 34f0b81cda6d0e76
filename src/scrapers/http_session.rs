//! Plain HTTP page session: reqwest for transport, `scraper` for the DOM.
//!
//! Works for the portal's server-rendered results. Form interaction is
//! replayed as the GET request the browser would have made. The same
//! session can serve saved pages from memory for offline runs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::html;
use super::session::{Navigation, PageSession, RowRead, SessionProvider};
use super::identity::ClientIdentity;
use crate::error::ScrapeError;

/// Page currently loaded in an [`HttpSession`].
#[derive(Debug, Clone)]
struct LoadedPage {
    url: String,
    html: String,
}

/// Where pages come from.
enum Fetcher {
    Live(Client),
    /// Saved pages keyed by exact URL; anything else is a 404.
    Replay(Arc<HashMap<String, String>>),
}

impl Fetcher {
    async fn get(&self, url: &str) -> Result<(u16, String, String), ScrapeError> {
        match self {
            Fetcher::Live(client) => {
                let response = client.get(url).send().await?;
                let status = response.status().as_u16();
                let final_url = response.url().to_string();
                Ok((status, final_url, response.text().await?))
            }
            Fetcher::Replay(pages) => Ok(match pages.get(url) {
                Some(html) => (200, url.to_string(), html.clone()),
                None => (404, url.to_string(), String::new()),
            }),
        }
    }
}

/// Session backed by a dedicated reqwest client with its own cookie store.
pub struct HttpSession {
    fetcher: Fetcher,
    page: Option<LoadedPage>,
    typed: Vec<(String, String)>,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self::with_fetcher(Fetcher::Live(client))
    }

    /// A session that serves `pages` instead of touching the network.
    pub fn replay(pages: Arc<HashMap<String, String>>) -> Self {
        Self::with_fetcher(Fetcher::Replay(pages))
    }

    fn with_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            page: None,
            typed: Vec::new(),
        }
    }

    fn set_override(&mut self, name: String, value: &str) {
        self.typed.retain(|(n, _)| n != &name);
        self.typed.push((name, value.to_string()));
    }

    fn current(&self) -> Result<&LoadedPage, ScrapeError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::UnexpectedPageState("no page loaded".to_string()))
    }
}

#[async_trait]
impl PageSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<Navigation, ScrapeError> {
        debug!("GET {}", url);
        let (status, final_url, html) = self.fetcher.get(url).await?;

        self.typed.clear();
        self.page = Some(LoadedPage {
            url: final_url.clone(),
            html,
        });

        Ok(Navigation {
            final_url,
            status: Some(status),
        })
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, ScrapeError> {
        html::has_match(&self.current()?.html, selector)
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), ScrapeError> {
        let name = html::first_attr(&self.current()?.html, selector, "name")?.ok_or_else(|| {
            ScrapeError::UnexpectedPageState(format!("input '{}' has no name attribute", selector))
        })?;

        self.set_override(name, text);
        Ok(())
    }

    async fn set_field(&mut self, name: &str, value: &str) -> Result<bool, ScrapeError> {
        let selector = format!("form [name='{}']", name);
        if !html::has_match(&self.current()?.html, &selector)? {
            return Ok(false);
        }
        self.set_override(name.to_string(), value);
        Ok(true)
    }

    async fn click(&mut self, selector: &str) -> Result<Navigation, ScrapeError> {
        let page = self.current()?;
        let target = html::form_submission_url(&page.html, &page.url, selector, &self.typed)?;
        self.navigate(&target).await
    }

    async fn table_rows(
        &mut self,
        table_selector: &str,
    ) -> Result<Option<Vec<RowRead>>, ScrapeError> {
        let rows = html::extract_table_rows(&self.current()?.html, table_selector)?;
        Ok(rows.map(|rows| rows.into_iter().map(Ok).collect()))
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        self.page = None;
        self.typed.clear();
        Ok(())
    }
}

/// Creates an [`HttpSession`] with a fresh client per scrape call.
#[derive(Debug, Clone)]
pub struct HttpSessionProvider {
    user_agent: Option<String>,
    timeout: Duration,
}

impl HttpSessionProvider {
    pub fn new(user_agent: Option<String>, timeout: Duration) -> Self {
        Self {
            user_agent,
            timeout,
        }
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        let identity = ClientIdentity::resolve(self.user_agent.as_deref());
        let client = Client::builder()
            .user_agent(identity.user_agent.as_str())
            .default_headers(identity.default_headers())
            .timeout(self.timeout)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| ScrapeError::SessionInit(e.to_string()))?;

        Ok(Box::new(HttpSession::new(client)))
    }
}

/// Serves saved HTML pages by URL.
#[derive(Debug, Clone, Default)]
pub struct ReplaySessionProvider {
    pages: Arc<HashMap<String, String>>,
}

impl ReplaySessionProvider {
    pub fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages: Arc::new(pages),
        }
    }
}

#[async_trait]
impl SessionProvider for ReplaySessionProvider {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        Ok(Box::new(HttpSession::replay(self.pages.clone())))
    }
}
