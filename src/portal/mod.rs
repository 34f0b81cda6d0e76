//! Contract with the instante.justice.md portal: URL dialect, selectors, row layout.

pub mod rows;
pub mod selectors;
pub mod url_builder;

pub use rows::{parse_row, RawRow};
pub use url_builder::{build_pdf_url, extract_pdf_id, filters_applied, QueryUrlBuilder};
