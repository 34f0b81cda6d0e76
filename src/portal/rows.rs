//! Positional parsing of result table rows into case records.

use crate::models::{CaseRecord, ParseMode};

use super::url_builder::{build_pdf_url, extract_pdf_id};

/// Placeholder for a required column the portal left blank.
pub const BLANK: &str = "N/A";

/// Minimum number of cells for a row to be a case.
pub const MIN_CELLS: usize = 3;

/// Path fragment identifying judgment PDF links.
const PDF_PATH: &str = "pigd_integration/pdf";

/// Cell texts and link targets of one table row, as read from the page.
///
/// A cell is `None` when its text could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub cells: Vec<Option<String>>,
    pub links: Vec<String>,
}

impl RawRow {
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: texts.into_iter().map(|t| Some(t.into())).collect(),
            links: Vec::new(),
        }
    }

    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }
}

/// Parse one row. Rows shorter than [`MIN_CELLS`] are not cases and yield `None`.
///
/// Columns: court, case number, case name/parties, ruling date,
/// registration date, topic. Extra cells are ignored.
pub fn parse_row(row: &RawRow, mode: ParseMode) -> Option<CaseRecord> {
    if row.cells.len() < MIN_CELLS {
        return None;
    }

    let name = required(row, 2);
    let (case_name, parties) = match mode {
        ParseMode::Legacy => (None, Some(name)),
        ParseMode::Extended => (Some(name), None),
    };

    let pdf_id = row
        .links
        .iter()
        .find(|href| href.contains(PDF_PATH))
        .and_then(|href| extract_pdf_id(href))
        .filter(|id| !id.is_empty());

    Some(CaseRecord {
        court: required(row, 0),
        case_number: required(row, 1),
        case_name,
        parties,
        judge: None,
        case_type: None,
        topic: optional(row, 5),
        ruling_date: optional(row, 3),
        registration_date: optional(row, 4),
        publication_date: None,
        pdf_url: pdf_id.as_deref().map(build_pdf_url),
        pdf_id,
    })
}

fn cell(row: &RawRow, index: usize) -> Option<&str> {
    row.cells
        .get(index)
        .and_then(|c| c.as_deref())
        .map(str::trim)
}

fn required(row: &RawRow, index: usize) -> String {
    cell(row, index)
        .filter(|t| !t.is_empty())
        .unwrap_or(BLANK)
        .to_string()
}

fn optional(row: &RawRow, index: usize) -> Option<String> {
    cell(row, index)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
