use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use url::Url;

use crate::error::IngestError;

/// Response content-types we recognize, mapped to the persisted extension.
const EXTENSION_BY_CONTENT_TYPE: &[(&str, &str)] = &[
    ("image/gif", ".gif"),
    ("image/png", ".png"),
    ("image/jpeg", ".jpeg"),
    ("image/jpg", ".jpeg"),
    ("video/mp4", ".mp4"),
    ("image/webp", ".webp"),
];

const DEFAULT_EXTENSION: &str = ".jpeg";

/// Download the discovered media asset. Returns the raw bytes together with
/// the extension classified from the response. A transport failure or
/// non-success status here aborts the current file, matching the page fetch.
pub fn download_media(client: &Client, media_url: &str) -> Result<(Vec<u8>, String), IngestError> {
    let network = |message: String| IngestError::Network {
        url: media_url.to_string(),
        message,
    };
    let resp = client
        .get(media_url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| network(e.to_string()))?;

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_lowercase())
        .unwrap_or_default();

    let bytes = resp.bytes().map_err(|e| network(e.to_string()))?;
    let ext = classify_extension(&content_type, media_url);
    Ok((bytes.to_vec(), ext))
}

/// Pick the file extension for a downloaded asset: by content-type first,
/// then by the URL path with the query stripped, defaulting to `.jpeg`.
/// Always returns a leading `.`.
pub fn classify_extension(content_type: &str, media_url: &str) -> String {
    if let Some((_, ext)) = EXTENSION_BY_CONTENT_TYPE
        .iter()
        .find(|(ct, _)| *ct == content_type)
    {
        return (*ext).to_string();
    }

    let path = Url::parse(media_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| {
            media_url
                .split(['?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        });
    match Path::new(&path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .filter(|e| !e.is_empty())
    {
        Some(ext) => format!(".{ext}"),
        None => DEFAULT_EXTENSION.to_string(),
    }
}

/// Write the asset as `<post_id><ext>` under `media_dir`, creating the
/// directory if needed. An existing asset for the same post id is replaced,
/// so re-ingesting a post is idempotent. Returns the local file name.
pub fn persist_media(bytes: &[u8], post_id: &str, ext: &str, media_dir: &Path) -> Result<String> {
    fs::create_dir_all(media_dir)
        .with_context(|| format!("creating media directory {}", media_dir.display()))?;
    let file_name = format!("{post_id}{ext}");
    let dest = media_dir.join(&file_name);
    fs::write(&dest, bytes).with_context(|| format!("writing media to {}", dest.display()))?;
    Ok(file_name)
}
