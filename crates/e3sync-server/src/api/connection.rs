use axum::{extract::State, Extension, Json};
use e3sync_shopify::ShopMetadata;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

/// Characters of the upstream token shown to the operator.
const TOKEN_PREVIEW_CHARS: usize = 10;

#[derive(Debug, Serialize)]
pub(super) struct ConnectionReport {
    upstream: UpstreamStatus,
    destination: DestinationStatus,
}

#[derive(Debug, Serialize)]
struct UpstreamStatus {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct DestinationStatus {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    shop: Option<ShopMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn token_preview(token: &str) -> String {
    let head: String = token.chars().take(TOKEN_PREVIEW_CHARS).collect();
    format!("{head}...")
}

/// Authenticates upstream and reads shop metadata. Always answers 200; each
/// side reports its own outcome.
pub(super) async fn connection_test(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<ConnectionReport>> {
    let upstream = match state.upstream.as_deref() {
        None => UpstreamStatus {
            ok: false,
            base_url: None,
            token_preview: None,
            error: Some("upstream API credentials are not configured".to_owned()),
        },
        Some(client) => match client.authenticate().await {
            Ok(token) => UpstreamStatus {
                ok: true,
                base_url: Some(client.base_url().to_owned()),
                token_preview: Some(token_preview(&token)),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "connection test: upstream authentication failed");
                UpstreamStatus {
                    ok: false,
                    base_url: Some(client.base_url().to_owned()),
                    token_preview: None,
                    error: Some(e.to_string()),
                }
            }
        },
    };

    let destination = match state.destination.as_deref() {
        None => DestinationStatus {
            ok: false,
            shop: None,
            error: Some("destination store credentials are not configured".to_owned()),
        },
        Some(client) => match client.query_shop_metadata().await {
            Ok(shop) => DestinationStatus {
                ok: true,
                shop: Some(shop),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "connection test: shop metadata query failed");
                DestinationStatus {
                    ok: false,
                    shop: None,
                    error: Some(e.to_string()),
                }
            }
        },
    };

    ApiResponse::new(
        req_id.0,
        ConnectionReport {
            upstream,
            destination,
        },
    )
}
