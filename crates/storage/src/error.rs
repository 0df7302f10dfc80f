//! Storage error types.

/// Errors produced by storage operations. None are retried here.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("authentication required: no active session")]
    Unauthenticated,

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upload aborted")]
    Aborted,

    #[error("invalid storage configuration: {0}")]
    Config(String),
}

impl StorageError {
    /// Builds a server error from a non-2xx response body.
    ///
    /// Uses the body's `message` or `error` field when it is JSON carrying
    /// one, otherwise `upload failed: <status>`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["message", "error"].iter().find_map(|field| {
                    v.get(*field)
                        .and_then(|m| m.as_str())
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| format!("upload failed: {status}"));
        StorageError::Server { status, message }
    }

    /// `true` for missing or expired credentials.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            StorageError::Unauthenticated
                | StorageError::Server {
                    status: 401 | 403,
                    ..
                }
        )
    }
}
