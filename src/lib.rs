//! Court decision search for the Moldovan courts portal (instante.justice.md).
//!
//! The portal publishes rulings behind a filterable, paginated results
//! table. This crate builds the portal's search URLs, drives a page session
//! (headless Chrome or plain HTTP) through the result pages, and parses the
//! rows into [`models::CaseRecord`]s.

pub mod config;
pub mod error;
pub mod models;
pub mod portal;
pub mod scrapers;
pub mod server;
pub mod services;

pub use config::Settings;
pub use error::{ScrapeError, ValidationError};
pub use models::{CaseRecord, FilterSet, ScrapeOutcome, ScrapeRequest};
pub use services::LitigationService;
