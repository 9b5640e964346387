//! Error types for the settlement dashboard.
//!
//! Only document-level fetch failures ever reach the user (inside the viewer's
//! error state). Quote misses and citation lookups that find nothing are not
//! errors and never produce one of these.

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document bytes could not be obtained
    #[error("Failed to fetch document: {0}")]
    Fetch(String),

    /// The bytes were fetched but are not a usable paginated document
    #[error("Failed to decode document: {0}")]
    Decode(String),

    #[error("Page {page} out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Case not found: {0}")]
    CaseNotFound(u64),

    /// Document role in a URL or payload was neither `settlement` nor `bid`
    #[error("Unknown document role: {0}")]
    UnknownRole(String),

    /// The analysis response held no parseable JSON object
    #[error("Could not parse analysis: {0}")]
    Analysis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] sled::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// HTTP status a handler should answer with for this error.
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Error::CaseNotFound(_) => StatusCode::NOT_FOUND,
            Error::UnknownRole(_) | Error::PageOutOfRange { .. } => StatusCode::BAD_REQUEST,
            Error::Fetch(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
