//! Search and PDF URL construction for instante.justice.md.

use std::collections::BTreeMap;

use crate::models::FilterSet;

/// Court decisions search page.
pub const BASE_URL: &str = "https://instante.justice.md/ro/hotaririle-instantei";

/// Prefix of every judgment PDF link.
pub const PDF_BASE_URL: &str = "https://instante.justice.md/ro/pigd_integration/pdf";

/// Builds deterministic search URLs from a filter set.
#[derive(Debug, Clone)]
pub struct QueryUrlBuilder {
    base_url: String,
}

impl Default for QueryUrlBuilder {
    fn default() -> Self {
        Self::new(BASE_URL)
    }
}

impl QueryUrlBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('?').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the search URL for a zero-based page index.
    ///
    /// Page 0 carries no `page` parameter at all; the portal treats
    /// `page=0` differently from its absence.
    pub fn build(&self, filters: &FilterSet, page: u32) -> String {
        let page_str = page.to_string();
        let fields = filter_fields(filters);
        let mut params: Vec<(&str, &str)> =
            vec![fields[0], fields[1], (QUERY_FIELD, filters.query_text())];
        params.extend_from_slice(&fields[2..]);

        if page > 0 {
            params.push(("page", &page_str));
        }

        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, encode_component(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.base_url, query)
    }
}

/// Form field holding the free-text query.
pub const QUERY_FIELD: &str = "Denumirea_dosarului";

/// Every search field other than the query text, in URL order, with the
/// value the filter set gives it. Unset filters map to "".
pub fn filter_fields(filters: &FilterSet) -> [(&'static str, &str); 5] {
    [
        ("Instance", filters.instance().wire_value()),
        ("Numarul_dosarului", filters.case_number().unwrap_or_default()),
        ("date", filters.ruling_date().unwrap_or_default()),
        ("Tematica_dosarului", filters.topic().unwrap_or_default()),
        ("Tipul_dosarului", filters.case_type().wire_value()),
    ]
}

/// Percent-encode a query value, leaving `/` literal (case numbers are `2-123/2024`).
fn encode_component(value: &str) -> String {
    urlencoding::encode(value).replace("%2F", "/")
}

/// Flat summary of the filters used, for response metadata.
pub fn filters_applied(filters: &FilterSet) -> BTreeMap<String, Option<String>> {
    let mut map = BTreeMap::new();
    map.insert(
        "denumirea_dosarului".to_string(),
        Some(filters.query_text().to_string()),
    );
    map.insert(
        "tipul_dosarului".to_string(),
        Some(filters.case_type().wire_value().to_string()),
    );
    map.insert(
        "instance".to_string(),
        Some(filters.instance().wire_value().to_string()),
    );
    map.insert(
        "numarul_dosarului".to_string(),
        filters.case_number().map(str::to_string),
    );
    map.insert(
        "data_pronuntarii".to_string(),
        filters.ruling_date().map(str::to_string),
    );
    map.insert(
        "tematica_dosarului".to_string(),
        filters.topic().map(str::to_string),
    );
    map.insert(
        "max_pages".to_string(),
        Some(filters.max_pages().to_string()),
    );
    map.insert(
        "download_pdfs".to_string(),
        Some(filters.download_pdfs().to_string()),
    );
    map.insert(
        "convert_to_markdown".to_string(),
        Some(filters.convert_to_markdown().to_string()),
    );
    map
}

/// Extract the document identifier from a PDF URL, a relative path, or a bare id.
pub fn extract_pdf_id(url_or_id: &str) -> Option<String> {
    if url_or_id.is_empty() {
        return None;
    }

    if url_or_id.contains(PDF_BASE_URL) || url_or_id.contains('/') {
        return url_or_id.rsplit('/').next().map(str::to_string);
    }

    Some(url_or_id.to_string())
}

/// Canonical PDF URL for a document identifier.
pub fn build_pdf_url(pdf_id: &str) -> String {
    format!("{}/{}", PDF_BASE_URL, pdf_id)
}
