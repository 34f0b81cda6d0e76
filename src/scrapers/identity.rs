//! How requests to the portal identify themselves.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

/// Identifies this crate; sent unless the config overrides it.
pub const CRATE_USER_AGENT: &str = "instante-scrape/0.3 (court decision search; debt.md)";

/// Desktop Chrome, matching the engine behind the browser session.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// The portal serves Romanian by default and Russian as a fallback.
pub const PORTAL_ACCEPT_LANGUAGE: &str = "ro-MD,ro;q=0.9,ru;q=0.8,en;q=0.6";

/// User agent and language preferences shared by every session kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub user_agent: String,
    pub accept_language: &'static str,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self::resolve(None)
    }
}

impl ClientIdentity {
    /// Resolve the configured `user_agent` value.
    ///
    /// `None` or empty is the crate agent, `chrome` (or `impersonate`) is a
    /// desktop Chrome string, anything else is sent verbatim.
    pub fn resolve(config: Option<&str>) -> Self {
        let user_agent = match config.map(str::trim) {
            None | Some("") => CRATE_USER_AGENT.to_string(),
            Some(v) if v.eq_ignore_ascii_case("chrome") || v.eq_ignore_ascii_case("impersonate") => {
                CHROME_USER_AGENT.to_string()
            }
            Some(custom) => custom.to_string(),
        };

        Self {
            user_agent,
            accept_language: PORTAL_ACCEPT_LANGUAGE,
        }
    }

    /// Headers for reqwest clients, alongside `user_agent`.
    pub fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/pdf;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(self.accept_language));
        headers
    }
}
