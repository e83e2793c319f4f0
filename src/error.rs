use thiserror::Error;

/// Failure of a single upstream request.
///
/// Missing fields inside an otherwise valid JSON body are not errors; the
/// normalizers turn them into placeholders instead.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("City not found")]
    NotFound,

    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}
