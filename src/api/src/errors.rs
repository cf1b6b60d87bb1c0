use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Failed to serialize request: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Pinning service token is not configured")]
    MissingToken,

    #[error("Error response ({status}): {body}")]
    HttpError { status: u16, body: String },
}
