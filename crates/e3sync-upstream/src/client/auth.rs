//! Token acquisition against an API whose auth contract is undocumented.
//!
//! Observed deployments accept different endpoints and payload spellings, so
//! authentication walks a fixed list of strategies and stops at the first
//! 2xx response that carries a token. The list is finite and ordered; there
//! is no retry loop beyond it.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use e3sync_core::UpstreamCredentials;
use serde_json::{json, Value};

/// Keys checked, in order, for the bearer token in an auth response.
pub(crate) const TOKEN_KEYS: &[&str] = &["access_token", "token", "accessToken"];

/// Lifetime assumed when the response carries no `expires_in`.
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Tokens are treated as expired this long before the server says so.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Longest lifetime honoured from `expires_in`.
const MAX_TOKEN_TTL_SECS: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PayloadShape {
    /// OAuth2 password grant with snake-case client fields.
    PasswordGrant,
    /// `clientId` / `secretKey` / `username` / `password`.
    CamelCase,
    /// `client_id` / `secret_key` / `user` / `password`.
    SnakeCase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AuthStrategy {
    pub path: &'static str,
    pub shape: PayloadShape,
}

pub(crate) const AUTH_STRATEGIES: &[AuthStrategy] = &[
    AuthStrategy {
        path: "/oauth/token",
        shape: PayloadShape::PasswordGrant,
    },
    AuthStrategy {
        path: "/auth",
        shape: PayloadShape::CamelCase,
    },
    AuthStrategy {
        path: "/api/auth",
        shape: PayloadShape::CamelCase,
    },
    AuthStrategy {
        path: "/auth",
        shape: PayloadShape::SnakeCase,
    },
    AuthStrategy {
        path: "/api/v1/auth",
        shape: PayloadShape::CamelCase,
    },
];

impl AuthStrategy {
    pub(crate) fn payload(&self, creds: &UpstreamCredentials) -> Value {
        match self.shape {
            PayloadShape::PasswordGrant => json!({
                "grant_type": "password",
                "client_id": creds.client_id,
                "client_secret": creds.secret_key,
                "username": creds.username,
                "password": creds.password,
            }),
            PayloadShape::CamelCase => json!({
                "clientId": creds.client_id,
                "secretKey": creds.secret_key,
                "username": creds.username,
                "password": creds.password,
            }),
            PayloadShape::SnakeCase => json!({
                "client_id": creds.client_id,
                "secret_key": creds.secret_key,
                "user": creds.username,
                "password": creds.password,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CachedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub(crate) fn from_response(body: &Value, now: DateTime<Utc>) -> Option<Self> {
        let value = extract_token(body)?;
        let ttl = expires_in(body).unwrap_or(DEFAULT_TOKEN_TTL_SECS);
        let usable = (ttl - EXPIRY_SKEW_SECS).max(0);
        let expires_at = ChronoDuration::try_seconds(usable)
            .and_then(|delta| now.checked_add_signed(delta))
            .or_else(|| {
                ChronoDuration::try_seconds(DEFAULT_TOKEN_TTL_SECS - EXPIRY_SKEW_SECS)
                    .and_then(|delta| now.checked_add_signed(delta))
            })
            .unwrap_or(now);
        Some(Self { value, expires_at })
    }

    pub(crate) fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// First non-empty string under one of [`TOKEN_KEYS`].
pub(crate) fn extract_token(body: &Value) -> Option<String> {
    TOKEN_KEYS
        .iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(ToOwned::to_owned)
}

fn expires_in(body: &Value) -> Option<i64> {
    match body.get("expires_in")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|secs| *secs > 0)
    .map(|secs| secs.min(MAX_TOKEN_TTL_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> UpstreamCredentials {
        UpstreamCredentials {
            client_id: "cid".to_owned(),
            secret_key: "sk".to_owned(),
            username: "user".to_owned(),
            password: "pw".to_owned(),
        }
    }

    #[test]
    fn strategies_start_with_password_grant() {
        assert_eq!(AUTH_STRATEGIES[0].path, "/oauth/token");
        assert_eq!(AUTH_STRATEGIES[0].shape, PayloadShape::PasswordGrant);
        assert_eq!(AUTH_STRATEGIES.len(), 5);
    }

    #[test]
    fn password_grant_payload_fields() {
        let body = AUTH_STRATEGIES[0].payload(&creds());
        assert_eq!(body["grant_type"], "password");
        assert_eq!(body["client_id"], "cid");
        assert_eq!(body["client_secret"], "sk");
        assert_eq!(body["username"], "user");
    }

    #[test]
    fn snake_case_payload_uses_user_field() {
        let body = AuthStrategy {
            path: "/auth",
            shape: PayloadShape::SnakeCase,
        }
        .payload(&creds());
        assert_eq!(body["user"], "user");
        assert_eq!(body["secret_key"], "sk");
        assert!(body.get("username").is_none());
    }

    #[test]
    fn extract_token_checks_keys_in_order() {
        let body = json!({"token": "second", "access_token": "first"});
        assert_eq!(extract_token(&body).as_deref(), Some("first"));
        let body = json!({"access_token": "", "accessToken": "third"});
        assert_eq!(extract_token(&body).as_deref(), Some("third"));
        assert!(extract_token(&json!({"ok": true})).is_none());
    }

    #[test]
    fn cached_token_honours_expires_in() {
        let now = Utc::now();
        let token =
            CachedToken::from_response(&json!({"access_token": "t", "expires_in": 120}), now)
                .unwrap();
        assert!(token.is_valid_at(now));
        assert!(token.is_valid_at(now + ChronoDuration::seconds(59)));
        assert!(!token.is_valid_at(now + ChronoDuration::seconds(60)));
    }

    #[test]
    fn cached_token_defaults_to_one_hour() {
        let now = Utc::now();
        let token = CachedToken::from_response(&json!({"token": "t"}), now).unwrap();
        assert!(token.is_valid_at(now + ChronoDuration::seconds(3000)));
        assert!(!token.is_valid_at(now + ChronoDuration::seconds(3600)));
    }

    #[test]
    fn cached_token_caps_oversized_expires_in() {
        let now = Utc::now();
        let token = CachedToken::from_response(
            &json!({"access_token": "t", "expires_in": 9_000_000_000_000_000_i64}),
            now,
        )
        .unwrap();
        assert!(token.is_valid_at(now + ChronoDuration::seconds(86_000)));
        assert!(!token.is_valid_at(now + ChronoDuration::seconds(86_400)));
    }

    #[test]
    fn cached_token_caps_oversized_string_expires_in() {
        let now = Utc::now();
        let token = CachedToken::from_response(
            &json!({"token": "t", "expires_in": "9223372036854775807"}),
            now,
        )
        .unwrap();
        assert!(!token.is_valid_at(now + ChronoDuration::seconds(86_400)));
    }
}
