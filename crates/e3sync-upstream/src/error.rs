use std::fmt;

use thiserror::Error;

/// One failed authentication strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAttempt {
    /// Request path the strategy posted to, e.g. `/oauth/token`.
    pub endpoint: &'static str,
    /// Short reason, e.g. `HTTP 401` or `no token in response body`.
    pub outcome: String,
}

/// Every strategy tried before authentication gave up, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthAttempts(pub Vec<AuthAttempt>);

impl fmt::Display for AuthAttempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} attempts", self.0.len())?;
        for (i, attempt) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{} -> {}", attempt.endpoint, attempt.outcome)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("upstream authentication failed after {attempts}")]
    Authentication { attempts: AuthAttempts },

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    Request {
        status: u16,
        url: String,
        body: String,
    },

    #[error("unrecognized response format for {context} (top-level keys: {keys})")]
    Format { context: String, keys: String },

    #[error("upstream API reported an error: {message}")]
    Api { message: String },

    #[error("product {code} not found upstream")]
    ProductNotFound { code: String },

    #[error("normalization error for product {code}: {reason}")]
    Normalization { code: String, reason: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error(transparent)]
    Config(#[from] e3sync_core::ConfigError),
}

impl UpstreamError {
    /// `true` when no token could be obtained; callers must not attempt data calls.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, UpstreamError::Authentication { .. })
    }

    /// `true` for a data call rejected with 401, which a fresh token may fix.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, UpstreamError::Request { status: 401, .. })
    }
}
