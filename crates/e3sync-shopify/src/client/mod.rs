//! Shopify Admin API client for product creation and store metadata.

use std::time::Duration;

use e3sync_core::{
    AppConfig, CanonicalProduct, CreatedProduct, DestinationMode, DestinationSettings,
    HttpSettings,
};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tokio::sync::OnceCell;

use crate::error::DestinationError;
use crate::payload::{
    product_create_variables, rest_product_body, PRIMARY_LOCATION_QUERY, PRODUCT_CREATE_MUTATION,
    SHOP_QUERY,
};
use crate::retry::retry_with_backoff;
use crate::types::{
    rest_user_errors, GraphQlResponse, LocationsData, ProductCreateData, RestProductEnvelope,
    ShopData, ShopMetadata,
};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Used when a 429 carries no parseable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 2;

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Client for one store's Admin API.
///
/// Product creation goes through GraphQL `productCreate` by default, or
/// `POST products.json` when configured for REST. Shop metadata and the
/// inventory location are always read over GraphQL.
pub struct ShopifyAdminClient {
    client: Client,
    /// `{origin}/admin/api/{version}`, no trailing slash.
    api_base: String,
    shop: String,
    access_token: String,
    mode: DestinationMode,
    max_retries: u32,
    retry_backoff_base_ms: u64,
    location: OnceCell<Option<String>>,
}

impl ShopifyAdminClient {
    /// Creates a client for `https://{settings.shop}`.
    ///
    /// # Errors
    ///
    /// - [`DestinationError::InvalidShop`] if the shop is not a bare domain.
    /// - [`DestinationError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        settings: &DestinationSettings,
        http: &HttpSettings,
    ) -> Result<Self, DestinationError> {
        let shop = normalize_shop(&settings.shop)?;
        let origin = format!("https://{shop}");
        Self::with_base_url(&origin, settings, http)
    }

    /// Creates a client that sends requests to `origin` instead of the shop
    /// domain. Used against local mock servers.
    ///
    /// # Errors
    ///
    /// - [`DestinationError::InvalidShop`] if `origin` is not a valid URL.
    /// - [`DestinationError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        origin: &str,
        settings: &DestinationSettings,
        http: &HttpSettings,
    ) -> Result<Self, DestinationError> {
        let origin = origin.trim_end_matches('/');
        Url::parse(origin).map_err(|e| DestinationError::InvalidShop {
            shop: origin.to_owned(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&http.user_agent)
            .build()?;

        Ok(Self {
            client,
            api_base: format!("{origin}/admin/api/{}", settings.api_version),
            shop: settings.shop.clone(),
            access_token: settings.access_token.clone(),
            mode: settings.mode,
            max_retries: http.max_retries,
            retry_backoff_base_ms: http.retry_backoff_base_ms,
            location: OnceCell::new(),
        })
    }

    /// # Errors
    ///
    /// Returns [`DestinationError::Config`] if the shop or access token is
    /// missing, or any error from [`ShopifyAdminClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, DestinationError> {
        Self::new(&config.destination_settings()?, &config.http_settings())
    }

    #[must_use]
    pub fn shop(&self) -> &str {
        &self.shop
    }

    #[must_use]
    pub fn mode(&self) -> DestinationMode {
        self.mode
    }

    /// Creates one product with a single variant and its images.
    ///
    /// Rate-limit and connection failures are retried with back-off; every
    /// other failure is returned as is.
    ///
    /// # Errors
    ///
    /// - [`DestinationError::Validation`] when the store rejects the payload.
    /// - Any transport-class [`DestinationError`] otherwise.
    pub async fn create_product(
        &self,
        product: &CanonicalProduct,
    ) -> Result<CreatedProduct, DestinationError> {
        let created = match self.mode {
            DestinationMode::GraphQl => {
                let location_id = self.primary_location_id().await;
                retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
                    self.create_via_graphql(product, location_id)
                })
                .await
            }
            DestinationMode::Rest => {
                retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
                    self.create_via_rest(product)
                })
                .await
            }
        }?;

        tracing::info!(
            code = %product.code,
            destination_id = %created.id,
            mode = %self.mode,
            "created product in destination"
        );
        Ok(created)
    }

    /// Store name, domain and plan.
    ///
    /// # Errors
    ///
    /// Returns any [`DestinationError`] from the GraphQL call.
    pub async fn query_shop_metadata(&self) -> Result<ShopMetadata, DestinationError> {
        let data: ShopData = retry_with_backoff(self.max_retries, self.retry_backoff_base_ms, || {
            self.execute_graphql(SHOP_QUERY, json!({}), "shop metadata")
        })
        .await?;
        Ok(ShopMetadata::from(data.shop))
    }

    /// The first store location, looked up once per client.
    ///
    /// A failed lookup is logged and cached as `None`; products are then
    /// created without stock quantities.
    pub async fn primary_location_id(&self) -> Option<&str> {
        self.location
            .get_or_init(|| async {
                match self
                    .execute_graphql::<LocationsData>(PRIMARY_LOCATION_QUERY, json!({}), "locations")
                    .await
                {
                    Ok(data) => {
                        let id = data.locations.nodes.into_iter().next().map(|n| n.id);
                        if id.is_none() {
                            tracing::warn!(shop = %self.shop, "store has no locations; inventory will not be set");
                        }
                        id
                    }
                    Err(e) => {
                        tracing::warn!(
                            shop = %self.shop,
                            error = %e,
                            "location lookup failed; inventory will not be set"
                        );
                        None
                    }
                }
            })
            .await
            .as_deref()
    }

    async fn create_via_graphql(
        &self,
        product: &CanonicalProduct,
        location_id: Option<&str>,
    ) -> Result<CreatedProduct, DestinationError> {
        let variables = product_create_variables(product, location_id);
        let data: ProductCreateData = self
            .execute_graphql(PRODUCT_CREATE_MUTATION, variables, "productCreate")
            .await?;

        let payload = data.product_create.ok_or_else(|| DestinationError::GraphQl {
            messages: vec!["productCreate returned no payload".to_owned()],
        })?;

        if !payload.user_errors.is_empty() {
            tracing::debug!(
                code = %product.code,
                user_errors = payload.user_errors.len(),
                "productCreate returned user errors"
            );
            return Err(DestinationError::Validation {
                user_errors: payload.user_errors,
            });
        }

        let node = payload.product.ok_or_else(|| DestinationError::GraphQl {
            messages: vec!["productCreate returned no product".to_owned()],
        })?;

        Ok(CreatedProduct {
            id: node.id,
            title: node.title,
        })
    }

    async fn create_via_rest(
        &self,
        product: &CanonicalProduct,
    ) -> Result<CreatedProduct, DestinationError> {
        let url = format!("{}/products.json", self.api_base);
        let response = self
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&rest_product_body(product))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(response.headers()));
        }

        let body = response.text().await?;

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let user_errors = serde_json::from_str::<serde_json::Value>(&body)
                .map(|value| rest_user_errors(&value))
                .unwrap_or_default();
            if !user_errors.is_empty() {
                return Err(DestinationError::Validation { user_errors });
            }
        }

        if !status.is_success() {
            return Err(transport(status, &body));
        }

        let envelope: RestProductEnvelope =
            serde_json::from_str(&body).map_err(|e| DestinationError::Deserialize {
                context: format!("response from {url}"),
                source: e,
            })?;

        Ok(CreatedProduct {
            id: envelope.product.destination_id(),
            title: envelope.product.title,
        })
    }

    async fn execute_graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: impl Serialize,
        context: &str,
    ) -> Result<T, DestinationError> {
        let url = format!("{}/graphql.json", self.api_base);
        let response = self
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let body = checked_body(response).await?;

        let parsed: GraphQlResponse<T> =
            serde_json::from_str(&body).map_err(|e| DestinationError::Deserialize {
                context: format!("{context} response"),
                source: e,
            })?;

        if !parsed.errors.is_empty() {
            if parsed.errors.iter().any(|e| e.is_throttled()) {
                return Err(DestinationError::RateLimited {
                    retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
                });
            }
            return Err(DestinationError::GraphQl {
                messages: parsed.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        parsed.data.ok_or_else(|| DestinationError::GraphQl {
            messages: vec![format!("no data in {context} response")],
        })
    }
}

/// Reads the body of a 2xx response; maps 429 and other statuses to errors.
async fn checked_body(response: Response) -> Result<String, DestinationError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(rate_limited(response.headers()));
    }
    let body = response.text().await?;
    if !status.is_success() {
        return Err(transport(status, &body));
    }
    Ok(body)
}

fn rate_limited(headers: &HeaderMap) -> DestinationError {
    // Shopify sends fractional seconds, e.g. "2.0".
    let retry_after_secs = headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map_or(DEFAULT_RETRY_AFTER_SECS, |secs| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let rounded = secs.ceil() as u64;
            rounded
        });
    DestinationError::RateLimited { retry_after_secs }
}

fn transport(status: StatusCode, body: &str) -> DestinationError {
    DestinationError::Transport {
        status: status.as_u16(),
        body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
    }
}

/// Accepts `my-store.myshopify.com`, with or without scheme and trailing slash.
fn normalize_shop(shop: &str) -> Result<String, DestinationError> {
    let trimmed = shop.trim();
    let bare = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');

    if bare.is_empty() || bare.contains('/') || bare.contains(char::is_whitespace) {
        return Err(DestinationError::InvalidShop {
            shop: shop.to_owned(),
            reason: "expected a bare store domain such as my-store.myshopify.com".to_owned(),
        });
    }
    Ok(bare.to_owned())
}
