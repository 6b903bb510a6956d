use std::net::SocketAddr;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which Shopify Admin API flavour product creation goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DestinationMode {
    #[default]
    GraphQl,
    Rest,
}

impl std::fmt::Display for DestinationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DestinationMode::GraphQl => write!(f, "graphql"),
            DestinationMode::Rest => write!(f, "rest"),
        }
    }
}

/// Password-grant credentials for the Elektro3 API.
#[derive(Clone, PartialEq, Eq)]
pub struct UpstreamCredentials {
    pub client_id: String,
    pub secret_key: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for UpstreamCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamCredentials")
            .field("client_id", &self.client_id)
            .field("secret_key", &"[redacted]")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Everything the Shopify Admin client needs to address one store.
#[derive(Clone, PartialEq, Eq)]
pub struct DestinationSettings {
    /// Store domain, e.g. `my-store.myshopify.com`.
    pub shop: String,
    pub access_token: String,
    pub api_version: String,
    pub mode: DestinationMode,
}

impl std::fmt::Debug for DestinationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationSettings")
            .field("shop", &self.shop)
            .field("access_token", &"[redacted]")
            .field("api_version", &self.api_version)
            .field("mode", &self.mode)
            .finish()
    }
}

/// Shared HTTP client knobs for both outbound APIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub api_keys: Vec<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub import_concurrency: usize,
    pub page_limit: u32,
    pub destination_max_retries: u32,
    pub destination_retry_backoff_base_ms: u64,
    pub upstream_base_url: String,
    pub upstream_client_id: Option<String>,
    pub upstream_secret_key: Option<String>,
    pub upstream_username: Option<String>,
    pub upstream_password: Option<String>,
    pub shopify_shop: Option<String>,
    pub shopify_access_token: Option<String>,
    pub shopify_api_version: String,
    pub shopify_api_mode: DestinationMode,
}

impl AppConfig {
    /// Upstream credentials, or the first missing variable.
    ///
    /// Credentials are optional at load time so the server can boot and
    /// report a useful error from the connection test instead of refusing
    /// to start.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] naming the first absent variable.
    pub fn upstream_credentials(&self) -> Result<UpstreamCredentials, ConfigError> {
        Ok(UpstreamCredentials {
            client_id: present(self.upstream_client_id.as_ref(), "ELEKTRO3_CLIENT_ID")?,
            secret_key: present(self.upstream_secret_key.as_ref(), "ELEKTRO3_SECRET_KEY")?,
            username: present(self.upstream_username.as_ref(), "ELEKTRO3_USERNAME")?,
            password: present(self.upstream_password.as_ref(), "ELEKTRO3_PASSWORD")?,
        })
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] if the shop or token is absent.
    pub fn destination_settings(&self) -> Result<DestinationSettings, ConfigError> {
        Ok(DestinationSettings {
            shop: present(self.shopify_shop.as_ref(), "SHOPIFY_SHOP")?,
            access_token: present(
                self.shopify_access_token.as_ref(),
                "SHOPIFY_ADMIN_API_ACCESS_TOKEN",
            )?,
            api_version: self.shopify_api_version.clone(),
            mode: self.shopify_api_mode,
        })
    }

    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout_secs: self.request_timeout_secs,
            user_agent: self.user_agent.clone(),
            max_retries: self.destination_max_retries,
            retry_backoff_base_ms: self.destination_retry_backoff_base_ms,
        }
    }
}

fn present(value: Option<&String>, var: &str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("import_concurrency", &self.import_concurrency)
            .field("page_limit", &self.page_limit)
            .field("destination_max_retries", &self.destination_max_retries)
            .field(
                "destination_retry_backoff_base_ms",
                &self.destination_retry_backoff_base_ms,
            )
            .field("upstream_base_url", &self.upstream_base_url)
            .field("upstream_client_id", &self.upstream_client_id)
            .field("upstream_secret_key", &redact(&self.upstream_secret_key))
            .field("upstream_username", &self.upstream_username)
            .field("upstream_password", &redact(&self.upstream_password))
            .field("shopify_shop", &self.shopify_shop)
            .field("shopify_access_token", &redact(&self.shopify_access_token))
            .field("shopify_api_version", &self.shopify_api_version)
            .field("shopify_api_mode", &self.shopify_api_mode)
            .finish()
    }
}
