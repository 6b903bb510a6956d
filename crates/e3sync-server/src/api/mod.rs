mod catalog;
mod connection;
mod import;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use e3sync_import::{CancelSignal, ImportReconciler};
use e3sync_shopify::ShopifyAdminClient;
use e3sync_upstream::{Elektro3Client, UpstreamError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

/// Shared handler state.
///
/// Either client is `None` when its credentials were absent at startup; the
/// routes that need it answer `not_configured` instead of failing to boot.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Option<Arc<Elektro3Client>>,
    pub destination: Option<Arc<ShopifyAdminClient>>,
    pub reconciler: ImportReconciler,
    pub page_limit: u32,
    /// Set on shutdown; running imports stop before their next product.
    pub cancel: CancelSignal,
}

impl AppState {
    pub(super) fn upstream(&self, request_id: &str) -> Result<&Elektro3Client, ApiError> {
        self.upstream.as_deref().ok_or_else(|| {
            ApiError::new(
                request_id,
                "not_configured",
                "upstream API credentials are not configured",
            )
        })
    }

    pub(super) fn destination(&self, request_id: &str) -> Result<&ShopifyAdminClient, ApiError> {
        self.destination.as_deref().ok_or_else(|| {
            ApiError::new(
                request_id,
                "not_configured",
                "destination store credentials are not configured",
            )
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    upstream: &'static str,
    destination: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: String, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" | "upstream_auth_failed" => StatusCode::BAD_GATEWAY,
            "not_configured" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_upstream_error(request_id: String, error: &UpstreamError) -> ApiError {
    match error {
        UpstreamError::ProductNotFound { .. } => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        UpstreamError::Authentication { .. } => {
            tracing::warn!(error = %error, "upstream authentication failed");
            ApiError::new(request_id, "upstream_auth_failed", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "upstream request failed");
            ApiError::new(request_id, "upstream_error", error.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", get(catalog::list_products))
        .route("/api/v1/categories", get(catalog::list_categories))
        .route("/api/v1/import", post(import::import_products))
        .route("/api/v1/connection-test", get(connection::connection_test))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let configured = |present: bool| if present { "configured" } else { "missing" };
    let data = HealthData {
        status: "ok",
        upstream: configured(state.upstream.is_some()),
        destination: configured(state.destination.is_some()),
    };
    (StatusCode::OK, ApiResponse::new(req_id.0, data))
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
