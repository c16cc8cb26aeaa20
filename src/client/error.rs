#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered `{success: false, error}`.
    #[error("{0}")]
    Application(String),

    /// Rejected before anything was sent.
    #[error("{0}")]
    Validation(String),

    #[error("Cancelled by user")]
    Cancelled,

    /// A previous request for the same control is still awaiting confirmation.
    #[error("Request already in progress")]
    Busy,

    #[error("Unexpected response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

pub type ClientResult<T> = Result<T, ClientError>;
