//! Search filters: the wire request and its validated form.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Longest query text the portal accepts in its name field.
pub const MAX_QUERY_LEN: usize = 200;
/// Default number of result pages to walk.
pub const DEFAULT_MAX_PAGES: u32 = 5;
/// Upper bound on `max_pages`.
pub const MAX_PAGES_LIMIT: u32 = 100;

/// Case type, encoded by the portal as `Tipul_dosarului`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CaseType {
    All,
    Civil,
    #[default]
    Contraventional,
    Penal,
}

impl CaseType {
    /// Value sent in the `Tipul_dosarului` query parameter.
    pub fn wire_value(&self) -> &'static str {
        match self {
            Self::All => "",
            Self::Civil => "1",
            Self::Contraventional => "2",
            Self::Penal => "3",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Civil => "civil",
            Self::Contraventional => "contraventional",
            Self::Penal => "penal",
        }
    }
}

impl FromStr for CaseType {
    type Err = String;

    /// Parse either a name (`penal`, `PENAL`) or a wire value (`3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Ok(Self::All),
            "civil" | "1" => Ok(Self::Civil),
            "contraventional" | "2" => Ok(Self::Contraventional),
            "penal" | "3" => Ok(Self::Penal),
            _ => Err(format!("unknown case type '{}'", s)),
        }
    }
}

impl TryFrom<String> for CaseType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CaseType> for String {
    fn from(value: CaseType) -> Self {
        value.as_str().to_string()
    }
}

/// Court instance filter, sent verbatim as the portal's `Instance` code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CourtInstance {
    #[default]
    All,
    Code(String),
}

impl CourtInstance {
    pub fn wire_value(&self) -> &str {
        match self {
            Self::All => "",
            Self::Code(code) => code,
        }
    }
}

impl From<String> for CourtInstance {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Code(trimmed.to_string())
        }
    }
}

impl From<CourtInstance> for String {
    fn from(value: CourtInstance) -> Self {
        match value {
            CourtInstance::All => String::new(),
            CourtInstance::Code(code) => code,
        }
    }
}

/// Search request as submitted by callers.
///
/// Accepts the portal's own Romanian field names and the legacy
/// single-field `company_name` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default, alias = "denumirea_dosarului")]
    pub query_text: Option<String>,
    /// Legacy payload field; used when `query_text` is absent.
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default, alias = "tipul_dosarului")]
    pub case_type: CaseType,
    #[serde(default)]
    pub instance: CourtInstance,
    #[serde(default, alias = "numarul_dosarului")]
    pub case_number: Option<String>,
    #[serde(default, alias = "data_pronuntarii")]
    pub ruling_date: Option<String>,
    #[serde(default, alias = "tematica_dosarului")]
    pub topic: Option<String>,
    #[serde(default)]
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub download_pdfs: bool,
    #[serde(default)]
    pub convert_to_markdown: bool,
}

impl ScrapeRequest {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: Some(query_text.into()),
            ..Default::default()
        }
    }

    /// The primary query text, preferring `query_text` over the legacy field.
    pub fn primary_text(&self) -> Option<&str> {
        self.query_text
            .as_deref()
            .or(self.company_name.as_deref())
    }

    /// Validate into a [`FilterSet`], enforcing `min_query_len` on the trimmed text.
    pub fn into_filters(self, min_query_len: usize) -> Result<FilterSet, ValidationError> {
        let query_text = self.primary_text().unwrap_or_default().trim().to_string();
        let len = query_text.chars().count();
        if len == 0 {
            return Err(ValidationError::EmptyQuery);
        }
        if len < min_query_len {
            return Err(ValidationError::QueryTooShort { min: min_query_len });
        }
        if len > MAX_QUERY_LEN {
            return Err(ValidationError::QueryTooLong { max: MAX_QUERY_LEN });
        }

        let max_pages = self.max_pages.unwrap_or(DEFAULT_MAX_PAGES);
        if !(1..=MAX_PAGES_LIMIT).contains(&max_pages) {
            return Err(ValidationError::MaxPagesOutOfRange { value: max_pages });
        }

        let ruling_date = non_empty(self.ruling_date);
        if let Some(ref date) = ruling_date {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|_| ValidationError::InvalidDate(date.clone()))?;
        }

        Ok(FilterSet {
            query_text,
            case_type: self.case_type,
            instance: self.instance,
            case_number: non_empty(self.case_number),
            ruling_date,
            topic: non_empty(self.topic),
            max_pages,
            download_pdfs: self.download_pdfs,
            convert_to_markdown: self.convert_to_markdown,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validated, read-only search filters for one scrape call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet {
    pub(crate) query_text: String,
    pub(crate) case_type: CaseType,
    pub(crate) instance: CourtInstance,
    pub(crate) case_number: Option<String>,
    pub(crate) ruling_date: Option<String>,
    pub(crate) topic: Option<String>,
    pub(crate) max_pages: u32,
    pub(crate) download_pdfs: bool,
    pub(crate) convert_to_markdown: bool,
}

impl FilterSet {
    /// Filters with defaults for everything but the query text.
    pub fn new(query_text: &str) -> Result<Self, ValidationError> {
        ScrapeRequest::new(query_text).into_filters(1)
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn case_type(&self) -> CaseType {
        self.case_type
    }

    pub fn instance(&self) -> &CourtInstance {
        &self.instance
    }

    pub fn case_number(&self) -> Option<&str> {
        self.case_number.as_deref()
    }

    pub fn ruling_date(&self) -> Option<&str> {
        self.ruling_date.as_deref()
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn download_pdfs(&self) -> bool {
        self.download_pdfs
    }

    pub fn convert_to_markdown(&self) -> bool {
        self.convert_to_markdown
    }
}
