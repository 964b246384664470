//! Error types for the clip pipeline boundaries

/// Errors raised while talking to the LLM endpoint
#[derive(thiserror::Error, Debug)]
pub enum LLMError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid LLM endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

/// Reasons an LLM response could not be turned into structured data
#[derive(thiserror::Error, Debug)]
pub enum MetadataParseError {
    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response is missing a title")]
    MissingTitle,
}

/// Errors raised while setting up a folder subscription
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("Filesystem watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error("Folder watcher must be started inside a Tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
