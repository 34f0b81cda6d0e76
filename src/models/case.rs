//! Court case records parsed from the portal's results table.

use serde::{Deserialize, Serialize};

/// Which name field a parsed row populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Column 2 goes to `parties` (the legacy litigation API).
    #[default]
    Legacy,
    /// Column 2 goes to `case_name`.
    Extended,
}

/// One result row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parties: Option<String>,
    pub court: String,
    pub judge: Option<String>,
    pub case_type: Option<String>,
    pub topic: Option<String>,
    pub ruling_date: Option<String>,
    pub registration_date: Option<String>,
    pub publication_date: Option<String>,
    pub pdf_url: Option<String>,
    pub pdf_id: Option<String>,
}

impl CaseRecord {
    /// Name of the case regardless of which parse mode produced it.
    pub fn display_name(&self) -> &str {
        self.case_name
            .as_deref()
            .or(self.parties.as_deref())
            .unwrap_or_default()
    }
}
