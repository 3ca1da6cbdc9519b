//! Network side of the pipeline: fetch the post page, scrape caption and
//! media URL out of it, then download and persist the media asset.

mod media;
mod page;

pub use media::{classify_extension, download_media, persist_media};
pub use page::{fetch_page, PageData};

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

/// Some hosts reject clients that do not identify as a browser.
const USER_AGENT: &str = "Mozilla/5.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the blocking client shared by the page and asset fetches.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("building HTTP client")
}
