//! Static HTML helpers over `scraper` for sessions that work on fetched markup.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScrapeError;
use crate::portal::selectors::{RESULT_CELLS, RESULT_ROWS, ROW_LINKS};
use crate::portal::RawRow;

fn parse_selector(css: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(css)
        .map_err(|e| ScrapeError::UnexpectedPageState(format!("invalid selector '{}': {}", css, e)))
}

/// Collapse whitespace runs the way rendered text would.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether any element in the document matches `css`.
pub fn has_match(html: &str, css: &str) -> Result<bool, ScrapeError> {
    let selector = parse_selector(css)?;
    let doc = Html::parse_document(html);
    let found = doc.select(&selector).next().is_some();
    Ok(found)
}

/// Value of `attr` on the first element matching `css`.
pub fn first_attr(html: &str, css: &str, attr: &str) -> Result<Option<String>, ScrapeError> {
    let selector = parse_selector(css)?;
    let doc = Html::parse_document(html);
    let value = doc
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::to_string);
    Ok(value)
}

/// Rows of the first table matching `table_css`, or `None` if there is no such table.
pub fn extract_table_rows(html: &str, table_css: &str) -> Result<Option<Vec<RawRow>>, ScrapeError> {
    let table_sel = parse_selector(table_css)?;
    let row_sel = parse_selector(RESULT_ROWS)?;
    let cell_sel = parse_selector(RESULT_CELLS)?;
    let link_sel = parse_selector(ROW_LINKS)?;

    let doc = Html::parse_document(html);
    let Some(table) = doc.select(&table_sel).next() else {
        return Ok(None);
    };

    let rows = table
        .select(&row_sel)
        .map(|row| RawRow {
            cells: row
                .select(&cell_sel)
                .map(|cell| Some(element_text(cell)))
                .collect(),
            links: row
                .select(&link_sel)
                .filter_map(|a| a.value().attr("href"))
                .map(str::to_string)
                .collect(),
        })
        .collect();

    Ok(Some(rows))
}

/// URL a browser would request when the GET form around `submit_css` is submitted.
///
/// `overrides` replace (or add) named field values, as typed by the caller.
pub fn form_submission_url(
    html: &str,
    page_url: &str,
    submit_css: &str,
    overrides: &[(String, String)],
) -> Result<String, ScrapeError> {
    let submit_sel = parse_selector(submit_css)?;
    let field_sel = parse_selector("input[name], select[name], textarea[name]")?;

    let doc = Html::parse_document(html);
    let submit = doc.select(&submit_sel).next().ok_or_else(|| {
        ScrapeError::UnexpectedPageState(format!("no element matches '{}'", submit_css))
    })?;

    let form = submit
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "form")
        .ok_or_else(|| {
            ScrapeError::UnexpectedPageState("submit control is not inside a form".to_string())
        })?;

    let method = form.value().attr("method").unwrap_or("get");
    if !method.eq_ignore_ascii_case("get") {
        return Err(ScrapeError::UnexpectedPageState(format!(
            "form method '{}' cannot be replayed over HTTP",
            method
        )));
    }

    let base = Url::parse(page_url)
        .map_err(|e| ScrapeError::UnexpectedPageState(format!("bad page URL {}: {}", page_url, e)))?;
    let mut action = base
        .join(form.value().attr("action").unwrap_or_default())
        .map_err(|e| ScrapeError::UnexpectedPageState(format!("bad form action: {}", e)))?;

    let mut pairs: Vec<(String, String)> = Vec::new();
    for field in form.select(&field_sel) {
        let el = field.value();
        let name = el.attr("name").unwrap_or_default().to_string();
        let value = match el.name() {
            "input" => {
                let kind = el.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "button" | "image" | "reset" | "file" => continue,
                    "checkbox" | "radio" if el.attr("checked").is_none() => continue,
                    "checkbox" | "radio" => el.attr("value").unwrap_or("on").to_string(),
                    _ => el.attr("value").unwrap_or_default().to_string(),
                }
            }
            "select" => selected_option(field)?,
            _ => field.text().collect::<String>(),
        };
        pairs.push((name, value));
    }

    for (name, value) in overrides {
        match pairs.iter_mut().find(|(n, _)| n == name) {
            Some(pair) => pair.1 = value.clone(),
            None => pairs.push((name.clone(), value.clone())),
        }
    }

    if let Some(name) = submit.value().attr("name") {
        let value = submit.value().attr("value").unwrap_or_default();
        pairs.push((name.to_string(), value.to_string()));
    }

    action.set_query(None);
    action.query_pairs_mut().extend_pairs(pairs.iter());

    Ok(action.to_string())
}

fn selected_option(select: ElementRef<'_>) -> Result<String, ScrapeError> {
    let selected = parse_selector("option[selected]")?;
    let any = parse_selector("option")?;
    let option = select
        .select(&selected)
        .next()
        .or_else(|| select.select(&any).next());

    Ok(option
        .map(|opt| {
            opt.value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| element_text(opt))
        })
        .unwrap_or_default())
}
