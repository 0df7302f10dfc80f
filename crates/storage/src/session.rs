//! Access to the caller's authenticated session.

/// Environment variable read by [`EnvSession`].
pub const ACCESS_TOKEN_ENV: &str = "SITEREPORT_ACCESS_TOKEN";

/// Supplies the bearer token for storage requests.
///
/// `None` means there is no usable session; uploads fail with
/// [`StorageError::Unauthenticated`](crate::StorageError::Unauthenticated).
pub trait SessionProvider: Send + Sync {
    fn access_token(&self) -> Option<String>;
}

/// A fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticSession(Option<String>);

impl StaticSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl SessionProvider for StaticSession {
    fn access_token(&self) -> Option<String> {
        self.0.clone().filter(|t| !t.is_empty())
    }
}

/// Reads the token from `SITEREPORT_ACCESS_TOKEN` on every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSession;

impl SessionProvider for EnvSession {
    fn access_token(&self) -> Option<String> {
        std::env::var(ACCESS_TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}
