//! Service configuration: optional TOML file, then environment overrides.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::ParseMode;
use crate::scrapers::{
    BrowserEngineConfig, BrowserSessionProvider, EngineOptions, HttpSessionProvider, SearchMode,
    SessionProvider,
};

/// Which page session backend drives the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    #[default]
    Browser,
    Http,
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "browser" | "chrome" => Ok(Self::Browser),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown session kind '{}'", other)),
        }
    }
}

fn parse_search_mode(s: &str) -> Result<SearchMode, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "direct" => Ok(SearchMode::Direct),
        "form" => Ok(SearchMode::Form),
        other => Err(format!("unknown search mode '{}'", other)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS on the HTTP API.
    pub allowed_origins: Vec<String>,
    pub session: SessionKind,
    pub search_mode: SearchMode,
    pub parse_mode: ParseMode,
    pub browser: BrowserEngineConfig,
    pub navigation_timeout_secs: u64,
    /// Wait after submitting the search form, in milliseconds.
    pub settle_ms: u64,
    /// Bound on a whole scrape call; unbounded when unset.
    pub deadline_secs: Option<u64>,
    pub min_query_len: usize,
    /// User agent for HTTP requests; "impersonate" picks a real browser string.
    pub user_agent: Option<String>,
    /// Where downloaded judgment PDFs are written.
    pub pdf_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "https://debt.md".to_string(),
            ],
            session: SessionKind::default(),
            search_mode: SearchMode::default(),
            parse_mode: ParseMode::default(),
            browser: BrowserEngineConfig::default(),
            navigation_timeout_secs: 30,
            settle_ms: 3000,
            deadline_secs: None,
            min_query_len: 3,
            user_agent: None,
            pdf_dir: PathBuf::from("./pdfs"),
        }
    }
}

impl Settings {
    /// Load from `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Empty values are ignored; unparseable ones are logged
    /// and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.host = host;
        }
        if let Some(port) = get("PORT") {
            set_parsed(&mut self.port, "PORT", &port, |v| v.parse::<u16>());
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(kind) = get("SCRAPER_SESSION") {
            set_parsed(&mut self.session, "SCRAPER_SESSION", &kind, SessionKind::from_str);
        }
        if let Some(mode) = get("SCRAPER_SEARCH_MODE") {
            set_parsed(&mut self.search_mode, "SCRAPER_SEARCH_MODE", &mode, parse_search_mode);
        }
        if let Some(headless) = get("HEADLESS") {
            set_parsed(&mut self.browser.headless, "HEADLESS", &headless, parse_bool);
        }
        if let Some(url) = get("CHROME_REMOTE_URL") {
            self.browser.remote_url = Some(url);
        }
        if let Some(secs) = get("NAVIGATION_TIMEOUT") {
            set_parsed(&mut self.navigation_timeout_secs, "NAVIGATION_TIMEOUT", &secs, |v| {
                v.parse::<u64>()
            });
        }
        if let Some(ms) = get("SETTLE_MS") {
            set_parsed(&mut self.settle_ms, "SETTLE_MS", &ms, |v| v.parse::<u64>());
        }
        if let Some(secs) = get("SCRAPE_DEADLINE") {
            match secs.parse::<u64>() {
                Ok(0) => self.deadline_secs = None,
                Ok(n) => self.deadline_secs = Some(n),
                Err(e) => tracing::warn!("Ignoring SCRAPE_DEADLINE={}: {}", secs, e),
            }
        }
        if let Some(ua) = get("USER_AGENT") {
            self.user_agent = Some(ua);
        }
        if let Some(dir) = get("PDF_DIR") {
            self.pdf_dir = PathBuf::from(dir);
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            navigation_timeout: self.navigation_timeout(),
            settle: Duration::from_millis(self.settle_ms),
            deadline: self.deadline_secs.map(Duration::from_secs),
            search_mode: self.search_mode,
            parse_mode: self.parse_mode,
        }
    }

    /// Build the session provider selected by `session`.
    pub fn session_provider(&self) -> Arc<dyn SessionProvider> {
        match self.session {
            SessionKind::Browser => {
                let mut browser = self.browser.clone();
                if browser.user_agent.is_none() {
                    browser.user_agent = self.user_agent.clone();
                }
                Arc::new(BrowserSessionProvider::new(browser))
            }
            SessionKind::Http => Arc::new(HttpSessionProvider::new(
                self.user_agent.clone(),
                self.navigation_timeout(),
            )),
        }
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("not a boolean: '{}'", other)),
    }
}

fn set_parsed<T, E, P>(slot: &mut T, key: &str, raw: &str, parse: P)
where
    E: std::fmt::Display,
    P: FnOnce(&str) -> Result<T, E>,
{
    match parse(raw.trim()) {
        Ok(value) => {
            tracing::debug!("Using {} from environment", key);
            *slot = value;
        }
        Err(e) => tracing::warn!("Ignoring {}={}: {}", key, raw, e),
    }
}
