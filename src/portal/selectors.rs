//! CSS selectors for the portal's search form and results table.
//!
//! The portal's markup is not stable, so each control has an ordered list of
//! candidates. Earlier entries are more specific and win when several match.

use crate::error::ControlKind;

const SEARCH_INPUT: &[&str] = &[
    "input#edit-denumirea-dosarului",
    "input[name='Denumirea_dosarului']",
    "form.views-exposed-form input[type='text']",
    "input[type='search']",
    "input[type='text']",
];

const SUBMIT_CONTROL: &[&str] = &[
    "input#edit-submit-hotaririle-instantei",
    "form.views-exposed-form input[type='submit']",
    "form.views-exposed-form button[type='submit']",
    "button[type='submit']",
    "input[type='submit']",
];

/// Candidates for the results table, most specific first.
pub const RESULTS_TABLE: &[&str] = &["table.views-table", "div.view-content table"];

/// Rows inside a located results table.
pub const RESULT_ROWS: &str = "tbody tr";

/// Cells inside a result row.
pub const RESULT_CELLS: &str = "td";

/// Links inside a result row.
pub const ROW_LINKS: &str = "a[href]";

/// Ordered candidate selectors for a control.
pub fn candidates(kind: ControlKind) -> &'static [&'static str] {
    match kind {
        ControlKind::SearchInput => SEARCH_INPUT,
        ControlKind::SubmitControl => SUBMIT_CONTROL,
        // Located by form field name instead.
        ControlKind::FilterField(_) => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_parse_as_css() {
        let extras = [RESULT_ROWS, RESULT_CELLS, ROW_LINKS];
        let all = candidates(ControlKind::SearchInput)
            .iter()
            .chain(candidates(ControlKind::SubmitControl))
            .chain(RESULTS_TABLE)
            .chain(extras.iter());
        for selector in all {
            assert!(
                scraper::Selector::parse(selector).is_ok(),
                "bad selector: {}",
                selector
            );
        }
    }

    #[test]
    fn test_generic_fallbacks_come_last() {
        assert_eq!(
            candidates(ControlKind::SearchInput).last(),
            Some(&"input[type='text']")
        );
        assert_eq!(
            candidates(ControlKind::SubmitControl).last(),
            Some(&"input[type='submit']")
        );
    }
}
