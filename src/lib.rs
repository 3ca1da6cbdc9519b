//! Ingestion pipeline for uploaded post-analytics exports.
//!
//! Each upload is a two-column key/value table (`.csv` or `.xlsx`) exported by
//! hand from a social platform's analytics page. The pipeline parses the
//! table, derives a stable post id from the post URL, scrapes the live post
//! page for caption and media, persists the media asset locally, and coerces
//! the metric columns into one normalized, storage-ready record.

pub mod coerce;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod resolve;

pub use error::IngestError;
pub use extract::UploadedFile;
pub use pipeline::{NormalizedPost, Pipeline, RecordObserver};
