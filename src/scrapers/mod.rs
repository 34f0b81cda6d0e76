//! Page sessions and the extraction engine for the court decisions portal.

pub mod aggregator;
pub mod browser;
pub mod engine;
pub mod html;
pub mod http_session;
pub mod pdf;
pub mod session;
pub mod identity;

pub use aggregator::ResultAggregator;
pub use identity::ClientIdentity;
pub use browser::{BrowserEngineConfig, BrowserSessionProvider};
pub use engine::{resolve_control, EngineOptions, ExtractionEngine, SearchMode};
pub use http_session::{HttpSession, HttpSessionProvider, ReplaySessionProvider};
pub use pdf::PdfDownloader;
pub use session::{Navigation, PageSession, RowRead, SessionProvider};
