//! One-shot search command.

use clap::Args;
use console::style;

use instante_scrape::config::{SessionKind, Settings};
use instante_scrape::models::{CaseType, CourtInstance, ScrapeRequest};
use instante_scrape::scrapers::SearchMode;
use instante_scrape::services::LitigationService;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Case name, party name or legal article (e.g. "art. 236")
    pub query: String,

    /// all, civil, contraventional or penal
    #[arg(short = 't', long)]
    pub case_type: Option<String>,

    /// Court instance code
    #[arg(short, long)]
    pub instance: Option<String>,

    /// Case number, e.g. 2-123/2024
    #[arg(short = 'n', long)]
    pub case_number: Option<String>,

    /// Ruling date (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Case topic
    #[arg(long)]
    pub topic: Option<String>,

    /// Maximum result pages to read (1-100)
    #[arg(short, long)]
    pub max_pages: Option<u32>,

    /// Download judgment PDFs into the configured directory
    #[arg(long)]
    pub download_pdfs: bool,

    /// Use the plain HTTP session instead of a browser
    #[arg(long)]
    pub http: bool,

    /// Submit the portal's search form instead of building the URL
    #[arg(long)]
    pub form: bool,
}

impl SearchArgs {
    fn into_request(self) -> anyhow::Result<ScrapeRequest> {
        let case_type = match self.case_type.as_deref() {
            Some(s) => s.parse::<CaseType>().map_err(anyhow::Error::msg)?,
            None => CaseType::default(),
        };

        Ok(ScrapeRequest {
            query_text: Some(self.query),
            case_type,
            instance: self.instance.map(CourtInstance::from).unwrap_or_default(),
            case_number: self.case_number,
            ruling_date: self.date,
            topic: self.topic,
            max_pages: self.max_pages,
            download_pdfs: self.download_pdfs,
            ..Default::default()
        })
    }
}

/// Run one search and print the outcome.
pub async fn cmd_search(mut settings: Settings, args: SearchArgs) -> anyhow::Result<()> {
    if args.http {
        settings.session = SessionKind::Http;
    }
    if args.form {
        settings.search_mode = SearchMode::Form;
    }

    let request = args.into_request()?;
    let service = LitigationService::from_settings(&settings);
    let outcome = service.search(request).await?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);

    if outcome.success {
        eprintln!(
            "{} {} cases from {} pages",
            style("✓").green(),
            outcome.total_cases,
            outcome.total_pages_scraped
        );
    } else {
        eprintln!(
            "{} {}",
            style("✗").red(),
            outcome.error.as_deref().unwrap_or("search failed")
        );
    }

    Ok(())
}
