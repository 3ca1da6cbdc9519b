use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDateTime;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::coerce::coerce_int;
use crate::error::IngestError;
use crate::extract::{self, UploadedFile};
use crate::fetch;
use crate::resolve;

/// Default asset directory, relative to the working directory.
pub const DEFAULT_MEDIA_DIR: &str = "static/media";

/// Key prefix of the tracked outbound-link column. The export names this
/// column after the link itself, so it is found by a prefix scan over the
/// table keys, not by a fixed key.
pub const TRACKED_LINK_PREFIX: &str = "https://flexicajourney.com/master-flexbox-and-grid";

/// Month-name date plus 12-hour clock, as the export renders them.
const INPUT_DATETIME_FORMAT: &str = "%b %d, %Y %I:%M %p";
const OUTPUT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REQUIRED_FIELDS: &[&str] = &["Post URL", "Post Date", "Post Publish Time"];

/// The storage-ready record assembled from one uploaded file. The metric
/// fields are always present; a missing or unparsable metric is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPost {
    pub post_id: String,
    pub post_url: String,
    pub media_url: Option<String>,
    pub caption: Option<String>,
    pub post_datetime: String,
    pub likes: i64,
    pub comments: i64,
    pub impressions: i64,
    pub members_reached: i64,
    pub total_clicks: i64,
    pub main_ebook_clicks: i64,
    pub lead_magnet_clicks: i64,
    pub profile_viewers: i64,
    pub followers_gained: i64,
    pub reactions: i64,
    pub reposts: i64,
    pub saves: i64,
    pub sends: i64,
}

/// Receives every assembled record. Injected at construction so callers pick
/// the sink instead of the pipeline writing to a process-wide facility.
pub trait RecordObserver {
    fn assembled(&self, post: &NormalizedPost);
}

/// Default observer: pretty-prints the record at info level.
pub struct LogObserver;

impl RecordObserver for LogObserver {
    fn assembled(&self, post: &NormalizedPost) {
        match serde_json::to_string_pretty(post) {
            Ok(json) => info!(post_id = %post.post_id, "assembled record:\n{json}"),
            Err(e) => warn!(post_id = %post.post_id, "could not serialize record: {e}"),
        }
    }
}

/// The ingestion pipeline: one instance per upload batch or long-lived, it
/// only touches the network and the asset directory.
pub struct Pipeline {
    client: Client,
    media_dir: PathBuf,
    observer: Box<dyn RecordObserver>,
}

impl Pipeline {
    pub fn new(media_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            client: fetch::build_client()?,
            media_dir: media_dir.into(),
            observer: Box::new(LogObserver),
        })
    }

    pub fn with_observer(mut self, observer: Box<dyn RecordObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Process an ordered batch of uploaded files, sequentially and in order.
    ///
    /// The first failing file aborts the batch and its error is the result;
    /// later files are never started. On success the *last* file's record is
    /// returned; earlier records are handed to the observer only.
    pub fn process(&self, files: &[UploadedFile]) -> Result<NormalizedPost, IngestError> {
        if files.is_empty() {
            return Err(IngestError::EmptyBatch);
        }

        let mut last = None;
        for file in files {
            let post = self.process_file(file)?;
            self.observer.assembled(&post);
            last = Some(post);
        }
        Ok(last.expect("non-empty batch yields at least one record"))
    }

    fn process_file(&self, file: &UploadedFile) -> Result<NormalizedPost, IngestError> {
        info!(file = %file.name, "processing upload");
        let table = extract::extract(file)?;

        for &field in REQUIRED_FIELDS {
            match table.get(field) {
                Some(v) if !v.to_text().trim().is_empty() => {}
                _ => {
                    return Err(IngestError::MissingRequiredField {
                        field,
                        file: file.name.clone(),
                    })
                }
            }
        }

        let post_url = table["Post URL"].to_text();
        let post_id = resolve::resolve(&post_url)?;

        let page = fetch::fetch_page(&self.client, &post_url)?;
        let media_url = match page.media_url.as_deref() {
            Some(remote) => {
                let (bytes, ext) = fetch::download_media(&self.client, remote)?;
                let name = fetch::persist_media(&bytes, &post_id, &ext, &self.media_dir)
                    .map_err(|e| IngestError::Unexpected {
                        file: file.name.clone(),
                        message: format!("{e:#}"),
                    })?;
                Some(name)
            }
            None => None,
        };

        let post_datetime = parse_post_datetime(
            table["Post Date"].to_text().trim(),
            table["Post Publish Time"].to_text().trim(),
        )?;

        let main_ebook_clicks = table
            .iter()
            .find(|(key, _)| key.starts_with(TRACKED_LINK_PREFIX))
            .map(|(_, value)| coerce_int(Some(value)))
            .unwrap_or(0);

        let metric = |key: &str| coerce_int(table.get(key));

        Ok(NormalizedPost {
            post_id,
            post_url,
            media_url,
            caption: page.caption,
            post_datetime,
            likes: metric("Reactions"),
            comments: metric("Comments"),
            impressions: metric("Impressions"),
            members_reached: metric("Members reached"),
            total_clicks: metric("Visits to links in this post"),
            main_ebook_clicks,
            // Reserved column in the storage schema; nothing feeds it yet.
            lead_magnet_clicks: 0,
            profile_viewers: metric("Profile viewers from this post"),
            followers_gained: metric("Followers gained from this post"),
            reactions: metric("Reactions"),
            reposts: metric("Reposts"),
            saves: metric("Saves"),
            sends: metric("Sends on LinkedIn"),
        })
    }
}

fn parse_post_datetime(date: &str, time: &str) -> Result<String, IngestError> {
    let combined = format!("{date} {time}");
    let parsed = NaiveDateTime::parse_from_str(&combined, INPUT_DATETIME_FORMAT).map_err(|e| {
        IngestError::DateTimeParse {
            message: format!("{e} (input {combined:?})"),
        }
    })?;
    Ok(parsed.format(OUTPUT_DATETIME_FORMAT).to_string())
}
