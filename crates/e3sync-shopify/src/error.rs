use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A field-level rejection reported by the Admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Path to the offending input field, e.g. `["input", "title"]`. Empty
    /// when the error is not tied to a field.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub field: Vec<String>,
    pub message: String,
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field.join("."), self.message)
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn join_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum DestinationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The store answered but refused the payload.
    #[error("destination rejected the product: {}", join_user_errors(.user_errors))]
    Validation { user_errors: Vec<UserError> },

    #[error("unexpected HTTP status {status} from destination: {body}")]
    Transport { status: u16, body: String },

    #[error("rate limited by destination (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("GraphQL error: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("invalid shop \"{shop}\": {reason}")]
    InvalidShop { shop: String, reason: String },

    #[error(transparent)]
    Config(#[from] e3sync_core::ConfigError),
}

impl DestinationError {
    /// The payload itself is at fault; resending it unchanged cannot succeed.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, DestinationError::Validation { .. })
    }

    /// Connectivity or protocol trouble rather than a rejected payload.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DestinationError::Http(_)
                | DestinationError::Transport { .. }
                | DestinationError::RateLimited { .. }
                | DestinationError::GraphQl { .. }
                | DestinationError::Deserialize { .. }
        )
    }

    /// Whether the client may resend the request on its own.
    ///
    /// Product creation is not idempotent, so only failures where the store
    /// cannot have processed the request qualify: HTTP 429 and connection
    /// failures. Timeouts and 5xx responses are left to the caller.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            DestinationError::RateLimited { .. } => true,
            DestinationError::Http(e) => e.is_connect(),
            _ => false,
        }
    }
}
