use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("source cannot be walked: {path}: {reason}")]
    SourceUnavailable { path: String, reason: String },

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend asked the caller to slow down (HTTP 429).
    #[error("{backend} is overloaded: {details}")]
    Overloaded { backend: String, details: String },

    #[error("invalid response from {backend} ({status}): {details}")]
    BackendResponse {
        backend: String,
        status: u16,
        details: String,
    },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store request failed: {0}")]
    Request(String),
}

impl StoreError {
    pub fn is_overloaded(&self) -> bool {
        matches!(self, StoreError::Overloaded { .. })
    }
}

pub type Result<T, E = IndexError> = std::result::Result<T, E>;
