//! HTTP client for the Elektro3 distributor API.

mod auth;

use std::time::Duration;

use chrono::Utc;
use e3sync_core::{AppConfig, HttpSettings, UpstreamCredentials};
use reqwest::{Client, Method, Url};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::envelope::{self, read_count, CATEGORY_EXTRACTORS, PRODUCT_EXTRACTORS};
use crate::error::{AuthAttempt, AuthAttempts, UpstreamError};
use crate::types::{Category, ProductFilter, ProductPage, UpstreamProduct};

use auth::{CachedToken, AUTH_STRATEGIES};

const PRODUCTS_PATH: &str = "/api/get-productos";
const PRODUCT_DETAIL_PATH: &str = "/api/get-producto";
const CATEGORIES_PATH: &str = "/api/get-categorias";
const LEGACY_CATEGORIES_PATH: &str = "/categories";

/// Error bodies longer than this are cut before being stored in errors.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for the Elektro3 catalog API.
///
/// Owns the bearer token: the first data call authenticates, later calls
/// reuse the cached token until it expires. A 401 on a data call drops the
/// cached token and retries that call once with a fresh one.
pub struct Elektro3Client {
    client: Client,
    base_url: String,
    credentials: UpstreamCredentials,
    token: Mutex<Option<CachedToken>>,
}

impl Elektro3Client {
    /// Creates a client for `base_url` (e.g. `https://api.elektro3.com`).
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::InvalidBaseUrl`] if `base_url` does not parse.
    /// - [`UpstreamError::Http`] if the underlying `reqwest::Client` cannot
    ///   be constructed.
    pub fn new(
        base_url: &str,
        credentials: UpstreamCredentials,
        http: &HttpSettings,
    ) -> Result<Self, UpstreamError> {
        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed).map_err(|e| UpstreamError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&http.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: trimmed.to_owned(),
            credentials,
            token: Mutex::new(None),
        })
    }

    /// # Errors
    ///
    /// Returns [`UpstreamError::Config`] if any upstream credential is missing,
    /// or any error from [`Elektro3Client::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, UpstreamError> {
        Self::new(
            &config.upstream_base_url,
            config.upstream_credentials()?,
            &config.http_settings(),
        )
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Obtains a fresh token by walking the authentication strategies in order.
    ///
    /// The token is cached for later data calls.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Authentication`] listing every attempt when no
    /// strategy produced a token.
    pub async fn authenticate(&self) -> Result<String, UpstreamError> {
        let mut attempts = Vec::with_capacity(AUTH_STRATEGIES.len());

        for strategy in AUTH_STRATEGIES {
            match self.try_strategy(strategy).await {
                Ok(token) => {
                    tracing::info!(
                        endpoint = strategy.path,
                        expires_at = %token.expires_at,
                        failed_attempts = attempts.len(),
                        "authenticated with upstream API"
                    );
                    let value = token.value.clone();
                    *self.token.lock().await = Some(token);
                    return Ok(value);
                }
                Err(outcome) => {
                    tracing::debug!(
                        endpoint = strategy.path,
                        shape = ?strategy.shape,
                        outcome = %outcome,
                        "authentication strategy failed"
                    );
                    attempts.push(AuthAttempt {
                        endpoint: strategy.path,
                        outcome,
                    });
                }
            }
        }

        let err = UpstreamError::Authentication {
            attempts: AuthAttempts(attempts),
        };
        tracing::warn!(error = %err, "all upstream authentication strategies exhausted");
        Err(err)
    }

    /// The cached token if still valid, otherwise a freshly obtained one.
    ///
    /// # Errors
    ///
    /// Propagates [`UpstreamError::Authentication`] from [`Elektro3Client::authenticate`].
    pub async fn bearer_token(&self) -> Result<String, UpstreamError> {
        {
            let cached = self.token.lock().await;
            if let Some(token) = cached.as_ref().filter(|t| t.is_valid_at(Utc::now())) {
                return Ok(token.value.clone());
            }
        }
        self.authenticate().await
    }

    /// Forgets the cached token so the next call re-authenticates.
    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Fetches one page of products.
    ///
    /// `page` and `limit` are clamped to at least 1.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Authentication`] if no token could be obtained.
    /// - [`UpstreamError::Request`] on a non-2xx response.
    /// - [`UpstreamError::Api`] if the body carries an error status.
    /// - [`UpstreamError::Format`] if no product array can be located.
    /// - [`UpstreamError::Http`] on network failure or timeout.
    /// - [`UpstreamError::Deserialize`] if the body is not JSON.
    pub async fn fetch_products(
        &self,
        filter: &ProductFilter,
        page: u32,
        limit: u32,
    ) -> Result<ProductPage, UpstreamError> {
        let page = page.max(1);
        let limit = limit.max(1);

        let mut payload = json!({ "page": page, "limit": limit });
        if let Some(filter) = filter.to_upstream() {
            // The endpoint expects the filter object JSON-encoded as a string.
            payload["filter"] = Value::String(Value::Object(filter).to_string());
        }

        let url = self.url(PRODUCTS_PATH);
        let body = self
            .send_authorized(Method::POST, &url, Some(&payload))
            .await?;
        let raw_items = envelope::extract(&body, PRODUCT_EXTRACTORS, "product listing")?
            .into_items();

        let raw_count = raw_items.len() as u64;
        let items = parse_products(raw_items);
        let total_count = read_count(&body, "total_items").unwrap_or(raw_count);
        let total_pages = read_count(&body, "total_pages")
            .unwrap_or_else(|| total_count.div_ceil(u64::from(limit)));

        tracing::debug!(
            page,
            limit,
            items = items.len(),
            total_count,
            total_pages,
            "fetched upstream product page"
        );

        Ok(ProductPage {
            items,
            total_count,
            total_pages,
            current_page: page,
        })
    }

    /// Fetches the category tree, falling back to the legacy listing endpoint
    /// when the primary one fails for any reason other than authentication.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Authentication`] if no token could be obtained.
    /// - Any error from the legacy endpoint once the primary one has failed.
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, UpstreamError> {
        let url = self.url(CATEGORIES_PATH);
        let primary = self
            .send_authorized(Method::POST, &url, Some(&json!({})))
            .await
            .and_then(|body| envelope::extract(&body, CATEGORY_EXTRACTORS, "category listing"));

        let raw_items = match primary {
            Ok(extracted) => extracted.into_items(),
            Err(err) if err.is_authentication() => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "category listing failed; trying legacy endpoint");
                let legacy_url = self.url(LEGACY_CATEGORIES_PATH);
                let body = self.send_authorized(Method::GET, &legacy_url, None).await?;
                match envelope::extract(&body, CATEGORY_EXTRACTORS, "legacy category listing") {
                    Ok(extracted) => extracted.into_items(),
                    Err(UpstreamError::Format { keys, .. }) => {
                        tracing::warn!(keys = %keys, "legacy category listing has no array");
                        Vec::new()
                    }
                    Err(other) => return Err(other),
                }
            }
        };

        Ok(raw_items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Category>(item) {
                Ok(category) => Some(category),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed category entry");
                    None
                }
            })
            .collect())
    }

    /// Fetches a single product by code.
    ///
    /// Tries the detail endpoint first and falls back to a filtered listing.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Authentication`] if no token could be obtained.
    /// - [`UpstreamError::ProductNotFound`] if neither lookup yields the code.
    /// - Any error from the fallback listing call.
    pub async fn fetch_product_details(&self, code: &str) -> Result<UpstreamProduct, UpstreamError> {
        let detail = match self.detail_url(code) {
            Ok(url) => self
                .send_authorized(Method::GET, &url, None)
                .await
                .and_then(|body| product_from_detail(&body, code)),
            Err(err) => Err(err),
        };

        match detail {
            Ok(product) => return Ok(product),
            Err(err) if err.is_authentication() => return Err(err),
            Err(err) => {
                tracing::debug!(code, error = %err, "detail lookup failed; falling back to filtered listing");
            }
        }

        let page = self
            .fetch_products(&ProductFilter::by_code(code), 1, 10)
            .await?;
        page.items
            .into_iter()
            .find(|p| p.code().as_deref() == Some(code))
            .ok_or_else(|| UpstreamError::ProductNotFound {
                code: code.to_owned(),
            })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn detail_url(&self, code: &str) -> Result<String, UpstreamError> {
        let mut url =
            Url::parse(&self.url(PRODUCT_DETAIL_PATH)).map_err(|e| UpstreamError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: e.to_string(),
            })?;
        url.path_segments_mut()
            .map_err(|()| UpstreamError::InvalidBaseUrl {
                base_url: self.base_url.clone(),
                reason: "base URL cannot carry path segments".to_owned(),
            })?
            .push(code);
        Ok(url.to_string())
    }

    async fn try_strategy(&self, strategy: &auth::AuthStrategy) -> Result<CachedToken, String> {
        let response = self
            .client
            .post(self.url(strategy.path))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&strategy.payload(&self.credentials))
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| format!("response body is not JSON: {e}"))?;

        CachedToken::from_response(&body, Utc::now())
            .ok_or_else(|| "no token in response body".to_owned())
    }

    /// Sends a bearer-authenticated request, re-authenticating once on 401.
    async fn send_authorized(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
    ) -> Result<Value, UpstreamError> {
        let token = self.bearer_token().await?;
        match self.send_json(method.clone(), url, payload, &token).await {
            Err(err) if err.is_unauthorized() => {
                tracing::info!(url, "upstream rejected cached token; re-authenticating");
                self.invalidate_token().await;
                let token = self.authenticate().await?;
                self.send_json(method, url, payload, &token).await
            }
            other => other,
        }
    }

    async fn send_json(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
        token: &str,
    ) -> Result<Value, UpstreamError> {
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Request {
                status: status.as_u16(),
                url: url.to_owned(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| UpstreamError::Deserialize {
            context: format!("response from {url}"),
            source: e,
        })
    }
}

/// Deserializes listing entries, skipping (and logging) any that are not objects.
fn parse_products(raw_items: Vec<Value>) -> Vec<UpstreamProduct> {
    raw_items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<UpstreamProduct>(item) {
            Ok(product) => Some(product),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed product entry");
                None
            }
        })
        .collect()
}

/// The detail endpoint answers with the bare record, or wraps it under
/// `data` / `producto`, sometimes as a one-element array.
fn product_from_detail(body: &Value, code: &str) -> Result<UpstreamProduct, UpstreamError> {
    let candidate = ["data", "producto"]
        .iter()
        .find_map(|key| body.get(*key))
        .unwrap_or(body);
    let candidate = match candidate {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };

    let not_found = || UpstreamError::ProductNotFound {
        code: code.to_owned(),
    };
    if !candidate.is_object() {
        return Err(not_found());
    }

    let product: UpstreamProduct =
        serde_json::from_value(candidate.clone()).map_err(|e| UpstreamError::Deserialize {
            context: format!("product detail for {code}"),
            source: e,
        })?;

    if product.code().is_none() {
        return Err(not_found());
    }
    Ok(product)
}
