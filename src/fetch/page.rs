use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use scraper::{Html, Selector};

use crate::error::IngestError;

/// What scraping a post page yields. Both fields may legitimately be absent;
/// that is a degraded result, not a failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageData {
    pub caption: Option<String>,
    pub media_url: Option<String>,
}

/// The platform's caption container. Falls back to the social-preview
/// description when the page does not render it.
static CAPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("p.attributed-text-segment-list__content").expect("caption selector")
});

static OG_DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:description"]"#).expect("og:description selector")
});

static OG_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("og:image selector"));

/// Fetch the post page and scrape it. A transport failure or non-success
/// status is fatal for the current file.
pub fn fetch_page(client: &Client, url: &str) -> Result<PageData, IngestError> {
    let network = |message: String| IngestError::Network {
        url: url.to_string(),
        message,
    };
    let html = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(|e| network(e.to_string()))?;
    Ok(scrape(&Html::parse_document(&html)))
}

fn scrape(doc: &Html) -> PageData {
    let caption = doc
        .select(&CAPTION)
        .next()
        .map(|p| {
            p.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .or_else(|| meta_content(doc, &OG_DESCRIPTION).map(|c| c.trim().to_string()));

    PageData {
        caption,
        media_url: meta_content(doc, &OG_IMAGE),
    }
}

fn meta_content(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .and_then(|m| m.value().attr("content"))
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
