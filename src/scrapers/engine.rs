//! Extraction engine: drives one session through the portal's result pages.
//!
//! Per call: open a session, then for each page navigate, read the results
//! table and parse its rows, stopping at `max_pages` or at the first page
//! without rows. The session is closed on every path out, including errors
//! and deadline expiry; if the call itself is dropped, the session's `Drop`
//! releases it.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::aggregator::ResultAggregator;
use super::session::{Navigation, PageSession, SessionProvider};
use crate::error::{ControlKind, ScrapeError};
use crate::models::{FilterSet, ParseMode, ScrapeOutcome};
use crate::portal::selectors::{self, RESULTS_TABLE};
use crate::portal::url_builder::filter_fields;
use crate::portal::{parse_row, QueryUrlBuilder};

/// How the first result page is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Navigate straight to the built search URL.
    #[default]
    Direct,
    /// Load the search page, fill every filter field and submit the form.
    Form,
}

/// Tunables for the extraction engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub navigation_timeout: Duration,
    /// Fixed wait after submitting the search form; the portal has no
    /// completion signal for its results.
    pub settle: Duration,
    /// Upper bound on the whole multi-page loop.
    pub deadline: Option<Duration>,
    pub search_mode: SearchMode,
    pub parse_mode: ParseMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            settle: Duration::from_secs(3),
            deadline: None,
            search_mode: SearchMode::Direct,
            parse_mode: ParseMode::Legacy,
        }
    }
}

/// Return the first candidate selector for `kind` that exists on the page.
///
/// Candidates are tried in priority order; the first match wins even if
/// later ones would also match.
pub async fn resolve_control(
    session: &mut dyn PageSession,
    kind: ControlKind,
) -> Result<&'static str, ScrapeError> {
    for &candidate in selectors::candidates(kind) {
        if session.exists(candidate).await? {
            debug!("Resolved {} via '{}'", kind, candidate);
            return Ok(candidate);
        }
    }
    Err(ScrapeError::ControlNotFound(kind))
}

/// Non-2xx responses are page-state errors; sessions without a status pass.
fn ensure_success(nav: Navigation) -> Result<Navigation, ScrapeError> {
    if nav.is_success() {
        return Ok(nav);
    }
    Err(ScrapeError::UnexpectedPageState(format!(
        "HTTP {} from {}",
        nav.status.unwrap_or_default(),
        nav.final_url
    )))
}

/// Caller-owned engine. Holds no per-call state, so one instance can serve
/// concurrent scrape calls, each with its own session.
pub struct ExtractionEngine {
    provider: Arc<dyn SessionProvider>,
    urls: QueryUrlBuilder,
    options: EngineOptions,
}

impl ExtractionEngine {
    pub fn new(provider: Arc<dyn SessionProvider>, options: EngineOptions) -> Self {
        Self {
            provider,
            urls: QueryUrlBuilder::default(),
            options,
        }
    }

    pub fn with_url_builder(mut self, urls: QueryUrlBuilder) -> Self {
        self.urls = urls;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Run one scrape call. Never fails outright: errors become a
    /// `success = false` outcome carrying the rows gathered so far.
    pub async fn scrape(&self, filters: &FilterSet) -> ScrapeOutcome {
        let mut aggregator = ResultAggregator::new(filters);
        info!(
            "Starting search for '{}' (max {} pages)",
            filters.query_text(),
            filters.max_pages()
        );

        let mut session = match self.provider.open().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not open session: {}", e);
                return aggregator.finish(Some(e));
            }
        };

        let result = match self.options.deadline {
            Some(limit) => {
                match timeout(limit, self.run(session.as_mut(), filters, &mut aggregator)).await {
                    Ok(result) => result,
                    Err(_) => Err(ScrapeError::DeadlineExceeded {
                        secs: limit.as_secs(),
                    }),
                }
            }
            None => self.run(session.as_mut(), filters, &mut aggregator).await,
        };

        if let Err(e) = session.close().await {
            warn!("Failed to release session: {}", e);
        }

        match result {
            Ok(()) => {
                info!(
                    "Search finished: {} cases from {} pages",
                    aggregator.len(),
                    aggregator.pages_scraped()
                );
                aggregator.finish(None)
            }
            Err(e) => {
                warn!(
                    "Search failed after {} pages ({} cases kept): {}",
                    aggregator.pages_scraped(),
                    aggregator.len(),
                    e
                );
                aggregator.finish(Some(e))
            }
        }
    }

    async fn run(
        &self,
        session: &mut dyn PageSession,
        filters: &FilterSet,
        aggregator: &mut ResultAggregator,
    ) -> Result<(), ScrapeError> {
        for page in 0..filters.max_pages() {
            let url = self.urls.build(filters, page);

            if page == 0 && self.options.search_mode == SearchMode::Form {
                self.navigate(session, self.urls.base_url()).await?;
                self.submit_search(session, filters).await?;
            } else {
                self.navigate(session, &url).await?;
            }
            aggregator.page_loaded();

            let found = self.extract_page(session, aggregator, &url).await?;
            info!("Page {}: {} cases", page + 1, found);

            if found == 0 {
                debug!("No rows on page {}, stopping", page + 1);
                break;
            }
        }
        Ok(())
    }

    async fn navigate(
        &self,
        session: &mut dyn PageSession,
        url: &str,
    ) -> Result<Navigation, ScrapeError> {
        let nav = timeout(self.options.navigation_timeout, session.navigate(url))
            .await
            .map_err(|_| ScrapeError::NavigationTimeout {
                url: url.to_string(),
                secs: self.options.navigation_timeout.as_secs(),
            })??;

        ensure_success(nav)
    }

    async fn submit_search(
        &self,
        session: &mut dyn PageSession,
        filters: &FilterSet,
    ) -> Result<(), ScrapeError> {
        let input = resolve_control(session, ControlKind::SearchInput).await?;
        session.type_text(input, filters.query_text()).await?;

        for (name, value) in filter_fields(filters) {
            let found = session.set_field(name, value).await?;
            if !found && !value.is_empty() {
                return Err(ScrapeError::ControlNotFound(ControlKind::FilterField(name)));
            }
        }

        let submit = resolve_control(session, ControlKind::SubmitControl).await?;
        let nav = timeout(self.options.navigation_timeout, session.click(submit))
            .await
            .map_err(|_| ScrapeError::NavigationTimeout {
                url: self.urls.base_url().to_string(),
                secs: self.options.navigation_timeout.as_secs(),
            })??;
        ensure_success(nav)?;

        if !self.options.settle.is_zero() {
            debug!("Waiting {:?} for results to settle", self.options.settle);
            tokio::time::sleep(self.options.settle).await;
        }
        Ok(())
    }

    /// Parse the current page's rows into the aggregator; returns how many were kept.
    async fn extract_page(
        &self,
        session: &mut dyn PageSession,
        aggregator: &mut ResultAggregator,
        url: &str,
    ) -> Result<usize, ScrapeError> {
        let read = async {
            for &table in RESULTS_TABLE {
                if let Some(rows) = session.table_rows(table).await? {
                    return Ok(Some(rows));
                }
            }
            Ok::<_, ScrapeError>(None)
        };

        let rows = timeout(self.options.navigation_timeout, read)
            .await
            .map_err(|_| ScrapeError::NavigationTimeout {
                url: url.to_string(),
                secs: self.options.navigation_timeout.as_secs(),
            })??;

        let Some(rows) = rows else {
            info!("No results table on page");
            return Ok(0);
        };

        let mut kept = 0;
        for row in rows {
            match row {
                Ok(raw) => match parse_row(&raw, self.options.parse_mode) {
                    Some(case) => {
                        aggregator.push(case);
                        kept += 1;
                    }
                    None => debug!("Skipping row with {} cells", raw.cells.len()),
                },
                Err(e) => debug!("Skipping unreadable row: {}", e),
            }
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::RowParseError;
    use crate::models::{CaseType, ScrapeRequest};
    use crate::portal::RawRow;
    use crate::scrapers::session::RowRead;

    /// Scripted page behaviour keyed by navigation count.
    #[derive(Clone, Default)]
    struct Script {
        /// Rows per navigation index; missing index means no table.
        pages: HashMap<usize, Vec<RowRead>>,
        /// Navigation index that hangs forever.
        hang_at: Option<usize>,
        /// Navigation index that fails with a transport error.
        fail_at: Option<usize>,
        /// Selectors that exist on every page.
        present: Vec<&'static str>,
        /// Search form field names that exist on every page.
        fields: Vec<&'static str>,
        /// Status returned by the form submit; 200 when unset.
        submit_status: Option<u16>,
    }

    #[derive(Default)]
    struct Log {
        urls: Mutex<Vec<String>>,
        typed: Mutex<Vec<(String, String)>>,
        clicked: Mutex<Vec<String>>,
        fields: Mutex<Vec<(String, String)>>,
        closes: AtomicUsize,
        drops: AtomicUsize,
    }

    struct ScriptSession {
        script: Script,
        log: Arc<Log>,
        current: usize,
    }

    #[async_trait]
    impl PageSession for ScriptSession {
        async fn navigate(&mut self, url: &str) -> Result<Navigation, ScrapeError> {
            let index = {
                let mut urls = self.log.urls.lock().unwrap();
                urls.push(url.to_string());
                urls.len() - 1
            };
            self.current = index;
            if self.script.hang_at == Some(index) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.script.fail_at == Some(index) {
                return Err(ScrapeError::Browser("connection reset".to_string()));
            }
            Ok(Navigation {
                final_url: url.to_string(),
                status: Some(200),
            })
        }

        async fn exists(&mut self, selector: &str) -> Result<bool, ScrapeError> {
            Ok(self.script.present.iter().any(|s| *s == selector))
        }

        async fn type_text(&mut self, selector: &str, text: &str) -> Result<(), ScrapeError> {
            self.log
                .typed
                .lock()
                .unwrap()
                .push((selector.to_string(), text.to_string()));
            Ok(())
        }

        async fn set_field(&mut self, name: &str, value: &str) -> Result<bool, ScrapeError> {
            if !self.script.fields.iter().any(|f| *f == name) {
                return Ok(false);
            }
            self.log
                .fields
                .lock()
                .unwrap()
                .push((name.to_string(), value.to_string()));
            Ok(true)
        }

        async fn click(&mut self, selector: &str) -> Result<Navigation, ScrapeError> {
            self.log.clicked.lock().unwrap().push(selector.to_string());
            Ok(Navigation {
                final_url: "https://instante.justice.md/ro/hotaririle-instantei?submitted"
                    .to_string(),
                status: Some(self.script.submit_status.unwrap_or(200)),
            })
        }

        async fn table_rows(
            &mut self,
            _table_selector: &str,
        ) -> Result<Option<Vec<RowRead>>, ScrapeError> {
            Ok(self.script.pages.get(&self.current).cloned())
        }

        async fn close(&mut self) -> Result<(), ScrapeError> {
            self.log.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Drop for ScriptSession {
        fn drop(&mut self) {
            self.log.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct ScriptProvider {
        script: Script,
        log: Arc<Log>,
    }

    #[async_trait]
    impl SessionProvider for ScriptProvider {
        async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
            Ok(Box::new(ScriptSession {
                script: self.script.clone(),
                log: self.log.clone(),
                current: 0,
            }))
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl SessionProvider for FailingProvider {
        async fn open(&self) -> Result<Box<dyn PageSession>, ScrapeError> {
            Err(ScrapeError::SessionInit("no chrome".to_string()))
        }
    }

    fn rows(prefix: &str, n: usize) -> Vec<RowRead> {
        (0..n)
            .map(|i| {
                Ok(RawRow::from_texts([
                    "Court".to_string(),
                    format!("{}-{}/2024", prefix, i),
                    "Parties".to_string(),
                ]))
            })
            .collect()
    }

    fn options() -> EngineOptions {
        EngineOptions {
            navigation_timeout: Duration::from_millis(200),
            settle: Duration::ZERO,
            ..Default::default()
        }
    }

    fn engine(script: Script, options: EngineOptions) -> (ExtractionEngine, Arc<Log>) {
        let log = Arc::new(Log::default());
        let provider = Arc::new(ScriptProvider {
            script,
            log: log.clone(),
        });
        (ExtractionEngine::new(provider, options), log)
    }

    fn filters(max_pages: u32) -> FilterSet {
        ScrapeRequest {
            max_pages: Some(max_pages),
            ..ScrapeRequest::new("art. 236")
        }
        .into_filters(3)
        .unwrap()
    }

    #[tokio::test]
    async fn test_single_page_never_navigates_twice() {
        let script = Script {
            pages: HashMap::from([(0, rows("p1", 20)), (1, rows("p2", 20))]),
            ..Default::default()
        };
        let (engine, log) = engine(script, options());

        let outcome = engine.scrape(&filters(1)).await;
        assert!(outcome.success);
        assert_eq!(outcome.total_cases, 20);
        assert_eq!(outcome.total_pages_scraped, 1);
        assert_eq!(log.urls.lock().unwrap().len(), 1);
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
        assert_eq!(log.drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pages_follow_built_urls() {
        let script = Script {
            pages: HashMap::from([(0, rows("a", 2)), (1, rows("b", 2)), (2, rows("c", 1))]),
            ..Default::default()
        };
        let (engine, log) = engine(script, options());
        let f = filters(3);

        let outcome = engine.scrape(&f).await;
        assert!(outcome.success);
        assert_eq!(outcome.total_cases, 5);
        assert_eq!(outcome.total_pages_scraped, 3);

        let builder = QueryUrlBuilder::default();
        let expected: Vec<String> = (0..3).map(|p| builder.build(&f, p)).collect();
        assert_eq!(*log.urls.lock().unwrap(), expected);
        assert_eq!(outcome.cases[0].case_number, "a-0/2024");
        assert_eq!(outcome.cases[4].case_number, "c-0/2024");
    }

    #[tokio::test]
    async fn test_empty_page_stops_pagination() {
        let script = Script {
            pages: HashMap::from([(0, rows("a", 3)), (1, Vec::new()), (2, rows("c", 3))]),
            ..Default::default()
        };
        let (engine, log) = engine(script, options());

        let outcome = engine.scrape(&filters(5)).await;
        assert!(outcome.success);
        assert_eq!(outcome.total_cases, 3);
        assert_eq!(outcome.total_pages_scraped, 2);
        assert_eq!(log.urls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_table_is_zero_results() {
        let (engine, log) = engine(Script::default(), options());

        let outcome = engine.scrape(&filters(5)).await;
        assert!(outcome.success);
        assert!(outcome.cases.is_empty());
        assert_eq!(outcome.error, None);
        assert_eq!(outcome.total_pages_scraped, 1);
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_on_second_page_keeps_first() {
        let script = Script {
            pages: HashMap::from([(0, rows("a", 2))]),
            fail_at: Some(1),
            ..Default::default()
        };
        let (engine, log) = engine(script, options());

        let outcome = engine.scrape(&filters(3)).await;
        assert!(!outcome.success);
        assert_eq!(outcome.total_pages_scraped, 1);
        assert_eq!(outcome.total_cases, 2);
        assert_eq!(outcome.cases[1].case_number, "a-1/2024");
        assert!(outcome.error.unwrap().contains("connection reset"));
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_navigation_timeout_is_reported_not_retried() {
        let script = Script {
            hang_at: Some(0),
            ..Default::default()
        };
        let (engine, log) = engine(script, options());

        let outcome = engine.scrape(&filters(3)).await;
        assert!(!outcome.success);
        assert_eq!(outcome.total_pages_scraped, 0);
        assert!(outcome.error.unwrap().contains("timed out"));
        assert_eq!(log.urls.lock().unwrap().len(), 1);
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deadline_wraps_whole_loop() {
        let script = Script {
            pages: HashMap::from([(0, rows("a", 1))]),
            hang_at: Some(1),
            ..Default::default()
        };
        let opts = EngineOptions {
            navigation_timeout: Duration::from_secs(60),
            deadline: Some(Duration::from_millis(100)),
            ..options()
        };
        let (engine, log) = engine(script, opts);

        let outcome = engine.scrape(&filters(3)).await;
        assert!(!outcome.success);
        assert_eq!(outcome.total_cases, 1);
        assert!(outcome.error.unwrap().contains("deadline"));
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_short_rows_leave_optional_fields_empty() {
        let page = vec![
            Ok(RawRow::from_texts([
                "Chisinau Court",
                "2-123/2024",
                "John Doe",
                "2024-01-05",
            ])),
            Ok(RawRow::from_texts(["Balti Court", "2-456/2024", "Jane Roe"])),
        ];
        let script = Script {
            pages: HashMap::from([(0, page)]),
            ..Default::default()
        };
        let (engine, _log) = engine(script, options());

        let outcome = engine.scrape(&filters(1)).await;
        assert!(outcome.success);
        assert_eq!(outcome.total_cases, 2);
        assert_eq!(outcome.total_pages_scraped, 1);
        assert_eq!(outcome.cases[0].ruling_date.as_deref(), Some("2024-01-05"));
        assert_eq!(outcome.cases[0].registration_date, None);
        assert_eq!(outcome.cases[1].ruling_date, None);
        assert_eq!(outcome.cases[1].registration_date, None);
        assert_eq!(outcome.filters_applied["tipul_dosarului"].as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_bad_rows_are_skipped() {
        let page = vec![
            Ok(RawRow::from_texts(["Court", "1-1/2024", "A"])),
            Err(RowParseError {
                index: 1,
                reason: "stale element".to_string(),
            }),
            Ok(RawRow::from_texts(["header only"])),
            Ok(RawRow::from_texts(["Court", "1-2/2024", "B"])),
        ];
        let script = Script {
            pages: HashMap::from([(0, page)]),
            ..Default::default()
        };
        let (engine, _log) = engine(script, options());

        let outcome = engine.scrape(&filters(1)).await;
        assert!(outcome.success);
        let numbers: Vec<_> = outcome.cases.iter().map(|c| c.case_number.as_str()).collect();
        assert_eq!(numbers, ["1-1/2024", "1-2/2024"]);
    }

    #[tokio::test]
    async fn test_session_init_failure() {
        let engine = ExtractionEngine::new(Arc::new(FailingProvider), options());
        let outcome = engine.scrape(&filters(1)).await;
        assert!(!outcome.success);
        assert_eq!(outcome.total_pages_scraped, 0);
        assert!(outcome.error.unwrap().contains("no chrome"));
    }

    #[tokio::test]
    async fn test_form_mode_prefers_earliest_selector() {
        let script = Script {
            pages: HashMap::from([(0, rows("a", 1))]),
            present: vec![
                "input[name='Denumirea_dosarului']",
                "input[type='text']",
                "button[type='submit']",
                "input[type='submit']",
            ],
            fields: vec!["Tipul_dosarului"],
            ..Default::default()
        };
        let opts = EngineOptions {
            search_mode: SearchMode::Form,
            ..options()
        };
        let (engine, log) = engine(script, opts);

        let outcome = engine.scrape(&filters(1)).await;
        assert!(outcome.success);
        assert_eq!(
            log.urls.lock().unwrap()[0],
            "https://instante.justice.md/ro/hotaririle-instantei"
        );
        assert_eq!(
            *log.typed.lock().unwrap(),
            vec![(
                "input[name='Denumirea_dosarului']".to_string(),
                "art. 236".to_string()
            )]
        );
        assert_eq!(*log.clicked.lock().unwrap(), vec!["button[type='submit']"]);
        assert_eq!(
            *log.fields.lock().unwrap(),
            vec![("Tipul_dosarului".to_string(), "2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_form_mode_missing_submit_names_control() {
        let script = Script {
            present: vec!["input[type='text']"],
            fields: vec!["Tipul_dosarului"],
            ..Default::default()
        };
        let opts = EngineOptions {
            search_mode: SearchMode::Form,
            ..options()
        };
        let (engine, log) = engine(script, opts);

        let outcome = engine.scrape(&filters(1)).await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("submit control not found on page")
        );
        assert!(log.clicked.lock().unwrap().is_empty());
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    fn form_filters(req: ScrapeRequest) -> FilterSet {
        ScrapeRequest {
            max_pages: Some(1),
            ..req
        }
        .into_filters(3)
        .unwrap()
    }

    fn form_script(fields: Vec<&'static str>) -> Script {
        Script {
            pages: HashMap::from([(0, rows("f", 1))]),
            present: vec!["input[type='text']", "input[type='submit']"],
            fields,
            ..Default::default()
        }
    }

    fn form_options() -> EngineOptions {
        EngineOptions {
            search_mode: SearchMode::Form,
            ..options()
        }
    }

    #[tokio::test]
    async fn test_form_mode_sets_every_filter_field() {
        let script = form_script(vec![
            "Instance",
            "Numarul_dosarului",
            "date",
            "Tematica_dosarului",
            "Tipul_dosarului",
        ]);
        let (engine, log) = engine(script, form_options());

        let f = form_filters(ScrapeRequest {
            case_type: CaseType::Penal,
            instance: "jdb".to_string().into(),
            case_number: Some("1-5/2024".to_string()),
            ruling_date: Some("2024-02-01".to_string()),
            topic: Some("furt".to_string()),
            ..ScrapeRequest::new("art. 236")
        });
        let outcome = engine.scrape(&f).await;
        assert!(outcome.success, "{:?}", outcome.error);

        let set: Vec<(String, String)> = log.fields.lock().unwrap().clone();
        let expect = [
            ("Instance", "jdb"),
            ("Numarul_dosarului", "1-5/2024"),
            ("date", "2024-02-01"),
            ("Tematica_dosarului", "furt"),
            ("Tipul_dosarului", "3"),
        ];
        assert_eq!(set.len(), expect.len());
        for ((name, value), (want_name, want_value)) in set.iter().zip(expect) {
            assert_eq!(name, want_name);
            assert_eq!(value, want_value);
        }
        // Filters are applied before the form is submitted.
        assert_eq!(log.clicked.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_form_mode_missing_filter_field_fails() {
        let (engine, log) = engine(form_script(vec!["Tipul_dosarului"]), form_options());

        let f = form_filters(ScrapeRequest {
            topic: Some("furt".to_string()),
            ..ScrapeRequest::new("art. 236")
        });
        let outcome = engine.scrape(&f).await;
        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("filter field 'Tematica_dosarului' not found on page")
        );
        assert!(log.clicked.lock().unwrap().is_empty());
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_form_mode_ignores_absent_fields_without_values() {
        let (engine, log) = engine(form_script(vec!["Tipul_dosarului"]), form_options());

        let outcome = engine.scrape(&form_filters(ScrapeRequest::new("art. 236"))).await;
        assert!(outcome.success, "{:?}", outcome.error);
        assert_eq!(outcome.total_cases, 1);
        assert_eq!(log.fields.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_form_submit_error_status_fails_call() {
        let script = Script {
            submit_status: Some(500),
            ..form_script(vec!["Tipul_dosarului"])
        };
        let (engine, log) = engine(script, form_options());

        let outcome = engine.scrape(&form_filters(ScrapeRequest::new("art. 236"))).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("HTTP 500"));
        assert_eq!(outcome.total_cases, 0);
        assert_eq!(outcome.total_pages_scraped, 0);
        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_call_releases_session_once() {
        let script = Script {
            hang_at: Some(0),
            ..Default::default()
        };
        let opts = EngineOptions {
            navigation_timeout: Duration::from_secs(3600),
            ..options()
        };
        let (engine, log) = engine(script, opts);
        let f = filters(3);

        // The caller gives up while the first navigation is still pending.
        let cancelled = tokio::time::timeout(Duration::from_millis(50), engine.scrape(&f)).await;
        assert!(cancelled.is_err());

        assert_eq!(log.urls.lock().unwrap().len(), 1);
        assert_eq!(log.closes.load(Ordering::SeqCst), 0);
        assert_eq!(log.drops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_aborted_task_releases_session_once() {
        let script = Script {
            hang_at: Some(0),
            ..Default::default()
        };
        let opts = EngineOptions {
            navigation_timeout: Duration::from_secs(3600),
            ..options()
        };
        let (engine, log) = engine(script, opts);
        let engine = Arc::new(engine);

        let task = tokio::spawn({
            let engine = engine.clone();
            async move { engine.scrape(&filters(3)).await }
        });
        while log.urls.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert_eq!(log.drops.load(Ordering::SeqCst), 1);
    }
}
