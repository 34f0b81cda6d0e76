//! Service layer shared by the CLI and the web server.

pub mod litigation;

pub use litigation::LitigationService;
