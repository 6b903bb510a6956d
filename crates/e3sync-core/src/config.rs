use crate::app_config::{AppConfig, DestinationMode, Environment};
use crate::ConfigError;

/// Upper bound for `E3SYNC_IMPORT_CONCURRENCY`.
pub const MAX_IMPORT_CONCURRENCY: usize = 8;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Vendor credentials are optional here; [`AppConfig::upstream_credentials`]
/// and [`AppConfig::destination_settings`] enforce presence where a client
/// is actually built.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("E3SYNC_ENV", "development"))?;
    let bind_addr = parse_addr("E3SYNC_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("E3SYNC_LOG_LEVEL", "info");
    let api_keys = or_default("E3SYNC_API_KEYS", "")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    let request_timeout_secs = parse_u64("E3SYNC_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(invalid(
            "E3SYNC_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let user_agent = or_default("E3SYNC_USER_AGENT", "e3sync/0.1 (catalog-import)");

    let import_concurrency = parse_usize("E3SYNC_IMPORT_CONCURRENCY", "1")?;
    if !(1..=MAX_IMPORT_CONCURRENCY).contains(&import_concurrency) {
        return Err(invalid(
            "E3SYNC_IMPORT_CONCURRENCY",
            format!("must be between 1 and {MAX_IMPORT_CONCURRENCY}, got {import_concurrency}"),
        ));
    }

    let page_limit = parse_u32("E3SYNC_PAGE_LIMIT", "20")?;
    let destination_max_retries = parse_u32("E3SYNC_DESTINATION_MAX_RETRIES", "2")?;
    let destination_retry_backoff_base_ms =
        parse_u64("E3SYNC_DESTINATION_RETRY_BACKOFF_BASE_MS", "500")?;

    let upstream_base_url = or_default("ELEKTRO3_API_URL", "https://api.elektro3.com")
        .trim_end_matches('/')
        .to_string();

    let shopify_api_mode = parse_destination_mode(&or_default("SHOPIFY_API_MODE", "graphql"))?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        api_keys,
        request_timeout_secs,
        user_agent,
        import_concurrency,
        page_limit,
        destination_max_retries,
        destination_retry_backoff_base_ms,
        upstream_base_url,
        upstream_client_id: optional("ELEKTRO3_CLIENT_ID"),
        upstream_secret_key: optional("ELEKTRO3_SECRET_KEY"),
        upstream_username: optional("ELEKTRO3_USERNAME"),
        upstream_password: optional("ELEKTRO3_PASSWORD"),
        shopify_shop: optional("SHOPIFY_SHOP"),
        shopify_access_token: optional("SHOPIFY_ADMIN_API_ACCESS_TOKEN"),
        shopify_api_version: or_default("SHOPIFY_API_VERSION", "2024-01"),
        shopify_api_mode,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "E3SYNC_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_destination_mode(s: &str) -> Result<DestinationMode, ConfigError> {
    match s.to_ascii_lowercase().as_str() {
        "graphql" => Ok(DestinationMode::GraphQl),
        "rest" => Ok(DestinationMode::Rest),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHOPIFY_API_MODE".to_string(),
            reason: format!("expected \"graphql\" or \"rest\", got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
