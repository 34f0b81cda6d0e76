//! Accumulates case records across result pages.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::error::ScrapeError;
use crate::models::{CaseRecord, FilterSet, ScrapeOutcome};
use crate::portal::filters_applied;

/// Records collected during one scrape call, in portal order.
#[derive(Debug)]
pub struct ResultAggregator {
    query: String,
    filters_applied: BTreeMap<String, Option<String>>,
    cases: Vec<CaseRecord>,
    pages_scraped: u32,
}

impl ResultAggregator {
    pub fn new(filters: &FilterSet) -> Self {
        Self {
            query: filters.query_text().to_string(),
            filters_applied: filters_applied(filters),
            cases: Vec::new(),
            pages_scraped: 0,
        }
    }

    /// Count a page whose navigation succeeded, whether or not it had rows.
    pub fn page_loaded(&mut self) {
        self.pages_scraped += 1;
    }

    pub fn push(&mut self, case: CaseRecord) {
        self.cases.push(case);
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn pages_scraped(&self) -> u32 {
        self.pages_scraped
    }

    /// Package the outcome. Any error makes it a failure that keeps the partial rows.
    pub fn finish(self, error: Option<ScrapeError>) -> ScrapeOutcome {
        ScrapeOutcome {
            success: error.is_none(),
            company_name: Some(self.query.clone()),
            query: self.query,
            filters_applied: self.filters_applied,
            total_cases: self.cases.len(),
            total_pages_scraped: self.pages_scraped,
            cases: self.cases,
            scraped_at: Utc::now(),
            error: error.map(|e| e.to_string()),
            documents: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParseMode;
    use crate::portal::{parse_row, RawRow};

    fn case(number: &str) -> CaseRecord {
        parse_row(
            &RawRow::from_texts(["Court", number, "Parties"]),
            ParseMode::Legacy,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_success_is_distinct_from_failure() {
        let filters = FilterSet::new("nobody").unwrap();

        let mut agg = ResultAggregator::new(&filters);
        agg.page_loaded();
        let ok = agg.finish(None);
        assert!(ok.success);
        assert!(ok.cases.is_empty());
        assert_eq!(ok.error, None);
        assert_eq!(ok.total_pages_scraped, 1);

        let failed = ResultAggregator::new(&filters)
            .finish(Some(ScrapeError::UnexpectedPageState("boom".to_string())));
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("unexpected page state: boom"));
    }

    #[test]
    fn test_preserves_arrival_order_and_partials() {
        let filters = FilterSet::new("query").unwrap();
        let mut agg = ResultAggregator::new(&filters);
        agg.page_loaded();
        for n in ["3-1/2024", "1-1/2024", "2-1/2024"] {
            agg.push(case(n));
        }

        let outcome = agg.finish(Some(ScrapeError::NavigationTimeout {
            url: "https://example.com".to_string(),
            secs: 30,
        }));
        assert!(!outcome.success);
        assert_eq!(outcome.total_cases, 3);
        let numbers: Vec<_> = outcome.cases.iter().map(|c| c.case_number.as_str()).collect();
        assert_eq!(numbers, ["3-1/2024", "1-1/2024", "2-1/2024"]);
        assert_eq!(outcome.company_name.as_deref(), Some("query"));
    }
}
