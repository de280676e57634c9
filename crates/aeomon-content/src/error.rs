use thiserror::Error;

/// Errors returned by the content-extraction client.
///
/// The classifier deliberately has no error type of its own: classification
/// failures fall back to the default category instead of propagating.
#[derive(Debug, Error)]
pub enum ContentError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The base URL passed at construction time is not a valid URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
