use thiserror::Error;

/// Everything that can terminate processing of an uploaded file or the batch.
///
/// `Display` renders the user-facing message the pipeline hands back verbatim,
/// naming the offending file or URL where one exists.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No files were uploaded.")]
    EmptyBatch,

    #[error("Unsupported file type: {file}. Please upload a .csv or .xlsx file.")]
    UnsupportedFormat { file: String },

    #[error("Could not read {file} as a two-column table: {message}")]
    Parse { file: String, message: String },

    #[error("'{field}' not found in the uploaded file {file}.")]
    MissingRequiredField { field: &'static str, file: String },

    #[error("Could not extract post ID from URL: {url}")]
    IdentifierNotFound { url: String },

    #[error("Error parsing date/time: {message}")]
    DateTimeParse { message: String },

    #[error("Error fetching post data from {url}: {message}")]
    Network { url: String, message: String },

    #[error("An unexpected error occurred while processing {file}: {message}")]
    Unexpected { file: String, message: String },
}
