//! Headless Chrome page session for the portal's JavaScript search form.
//!
//! Uses chromiumoxide (CDP). Each scrape call launches (or connects to) its
//! own browser and tears it down when the call ends.

mod config;

pub use config::BrowserEngineConfig;

use async_trait::async_trait;

use super::session::{PageSession, SessionProvider};
use crate::error::ScrapeError;

#[cfg(feature = "browser")]
use std::time::Duration;

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
#[cfg(feature = "browser")]
use chromiumoxide::element::Element;
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

#[cfg(feature = "browser")]
use super::session::{Navigation, RowRead};
#[cfg(feature = "browser")]
use super::identity::ClientIdentity;
#[cfg(feature = "browser")]
use crate::error::RowParseError;
#[cfg(feature = "browser")]
use crate::portal::selectors::{RESULT_CELLS, RESULT_ROWS, ROW_LINKS};
#[cfg(feature = "browser")]
use crate::portal::RawRow;

/// Resolves once the document is interactive, or after 10s regardless.
#[cfg(feature = "browser")]
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete' || document.readyState === 'interactive') {
            resolve(document.readyState);
        } else {
            document.addEventListener('DOMContentLoaded', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Launches a browser per scrape call.
#[derive(Debug, Clone, Default)]
pub struct BrowserSessionProvider {
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    config: BrowserEngineConfig,
}

impl BrowserSessionProvider {
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self { config }
    }
}

/// One browser with a single tab.
#[cfg(feature = "browser")]
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    /// False when attached to a remote browser we must not shut down.
    owned: bool,
}

#[cfg(feature = "browser")]
impl BrowserSessionProvider {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    /// Find Chrome executable.
    fn find_chrome() -> Result<std::path::PathBuf, ScrapeError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(output) = std::process::Command::new("which").arg(cmd).output() {
                if output.status.success() {
                    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !path.is_empty() {
                        info!("Found Chrome in PATH: {}", path);
                        return Ok(std::path::PathBuf::from(path));
                    }
                }
            }
        }

        Err(ScrapeError::SessionInit(
            "Chrome/Chromium not found. Install chromium or set browser.remote_url".to_string(),
        ))
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), ScrapeError> {
        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = Self::find_chrome()?;
        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .request_timeout(Duration::from_secs(self.config.timeout));

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--no-sandbox") // Often needed for headless in containers
            .arg("--disable-gpu");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| ScrapeError::SessionInit(format!("invalid browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::SessionInit(format!("failed to launch browser: {}", e)))?;

        let task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, task))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&self, url: &str) -> Result<(Browser, JoinHandle<()>), ScrapeError> {
        info!(
            "Connecting to remote browser at {} (timeout: {}s)",
            url, self.config.timeout
        );

        // Get WebSocket URL from the /json/version endpoint
        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(|e| ScrapeError::SessionInit(format!("remote browser unreachable: {}", e)))?
            .json()
            .await
            .map_err(|e| ScrapeError::SessionInit(format!("bad browser version info: {}", e)))?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                ScrapeError::SessionInit("no webSocketDebuggerUrl in response".to_string())
            })?;

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: Duration::from_secs(self.config.timeout),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| ScrapeError::SessionInit(format!("failed to connect: {}", e)))?;

        let task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, task))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl SessionProvider for BrowserSessionProvider {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        let (browser, handler, owned) = match self.config.remote_url.as_deref() {
            Some(url) => {
                let (browser, handler) = self.connect_remote(url).await?;
                (browser, handler, false)
            }
            None => {
                let (browser, handler) = self.launch().await?;
                (browser, handler, true)
            }
        };

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(ScrapeError::SessionInit(format!("failed to open tab: {}", e)));
            }
        };

        // Chrome keeps its own agent unless one is configured; the language
        // preference always applies.
        let identity = ClientIdentity::resolve(self.config.user_agent.as_deref());
        let user_agent = match self.config.user_agent {
            Some(_) => identity.user_agent,
            None => browser.user_agent().await.unwrap_or_default(),
        };
        let mut params = SetUserAgentOverrideParams::new(user_agent);
        params.accept_language = Some(identity.accept_language.to_string());
        if let Err(e) = page.execute(params).await {
            warn!("Failed to override user agent: {}", e);
        }

        Ok(Box::new(BrowserSession {
            browser,
            page,
            handler,
            owned,
        }))
    }
}

#[cfg(feature = "browser")]
impl BrowserSession {
    async fn read_row(row: &Element) -> Result<RawRow, ScrapeError> {
        let mut cells = Vec::new();
        for cell in row.find_elements(RESULT_CELLS).await? {
            // An unreadable cell degrades to None; the rest of the row survives.
            cells.push(cell.inner_text().await.ok().flatten());
        }

        let mut links = Vec::new();
        if let Ok(anchors) = row.find_elements(ROW_LINKS).await {
            for anchor in anchors {
                if let Ok(Some(href)) = anchor.attribute("href").await {
                    links.push(href);
                }
            }
        }

        Ok(RawRow { cells, links })
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageSession for BrowserSession {
    async fn navigate(&mut self, url: &str) -> Result<Navigation, ScrapeError> {
        info!("Navigating to {}", url);
        self.page.goto(url).await?;

        match self.page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()).await {
            Ok(result) => {
                let state: String = result
                    .into_value()
                    .unwrap_or_else(|_| "unknown".to_string());
                debug!("Page ready state: {}", state);
            }
            Err(e) => debug!("Could not check ready state: {}", e),
        }

        let final_url = self
            .page
            .url()
            .await?
            .unwrap_or_else(|| url.to_string());

        // CDP navigation does not expose the response status
        Ok(Navigation {
            final_url,
            status: None,
        })
    }

    async fn exists(&mut self, selector: &str) -> Result<bool, ScrapeError> {
        Ok(!self.page.find_elements(selector).await?.is_empty())
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), ScrapeError> {
        let input = self.page.find_element(selector).await?;
        input
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        input.focus().await?;
        input.type_str(text).await?;
        Ok(())
    }

    async fn set_field(&mut self, name: &str, value: &str) -> Result<bool, ScrapeError> {
        let selector = format!("form [name='{}']", name);
        let Some(field) = self.page.find_elements(selector).await?.into_iter().next() else {
            return Ok(false);
        };

        let literal = serde_json::to_string(value)
            .map_err(|e| ScrapeError::Browser(format!("cannot encode field value: {}", e)))?;
        let script = format!(
            "function() {{ this.value = {}; this.dispatchEvent(new Event('change', {{ bubbles: true }})); }}",
            literal
        );
        field.call_js_fn(script, false).await?;
        Ok(true)
    }

    async fn click(&mut self, selector: &str) -> Result<Navigation, ScrapeError> {
        self.page.find_element(selector).await?.click().await?;
        if let Err(e) = self.page.wait_for_navigation().await {
            debug!("No navigation after click: {}", e);
        }

        let final_url = self.page.url().await?.unwrap_or_default();
        Ok(Navigation {
            final_url,
            status: None,
        })
    }

    async fn table_rows(
        &mut self,
        table_selector: &str,
    ) -> Result<Option<Vec<RowRead>>, ScrapeError> {
        let Some(table) = self.page.find_elements(table_selector).await?.into_iter().next() else {
            return Ok(None);
        };

        let rows = table.find_elements(RESULT_ROWS).await?;
        debug!("Found {} table rows", rows.len());

        let mut out = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            out.push(Self::read_row(row).await.map_err(|e| RowParseError {
                index,
                reason: e.to_string(),
            }));
        }

        Ok(Some(out))
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        if let Err(e) = self.page.clone().close().await {
            debug!("Failed to close tab: {}", e);
        }

        if self.owned {
            self.browser.close().await?;
            if let Err(e) = self.browser.wait().await {
                warn!("Browser process did not exit cleanly: {}", e);
            }
        }

        self.handler.abort();
        info!("Browser closed");
        Ok(())
    }
}

#[cfg(feature = "browser")]
impl Drop for BrowserSession {
    fn drop(&mut self) {
        // chromiumoxide kills a launched child process when `Browser` drops;
        // the handler task has to be stopped by hand.
        self.handler.abort();
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
#[async_trait]
impl SessionProvider for BrowserSessionProvider {
    async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
        Err(ScrapeError::SessionInit(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }
}
