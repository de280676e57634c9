use thiserror::Error;

/// Errors returned by the answer-provider clients.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network or TLS failure from the underlying HTTP client, including
    /// non-2xx statuses surfaced via `error_for_status`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned an application-level error payload.
    #[error("provider API error: {0}")]
    Api(String),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The provider call succeeded but produced nothing usable. This is an
    /// outcome, not a fault: the pass runner records a `no_result` row and
    /// moves on.
    #[error("provider returned no usable answer")]
    NoResult,

    /// The base URL passed at construction time is not a valid URL.
    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
