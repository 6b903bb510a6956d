use axum::{extract::State, Extension, Json};
use e3sync_core::ImportReport;
use e3sync_import::ImportError;
use e3sync_upstream::UpstreamProduct;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

/// Largest batch accepted in one request.
pub(super) const MAX_BATCH_SIZE: usize = 250;

#[derive(Debug, Deserialize)]
pub(super) struct ImportRequest {
    pub products: Vec<UpstreamProduct>,
}

/// Imports the submitted raw records and returns the per-item report.
///
/// Per-item failures are part of a 200 response; only a failed upstream
/// authentication rejects the whole request.
pub(super) async fn import_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    if request.products.len() > MAX_BATCH_SIZE {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!(
                "batch of {} products exceeds the limit of {MAX_BATCH_SIZE}",
                request.products.len()
            ),
        ));
    }

    let upstream = state.upstream(&req_id.0)?;
    let destination = state.destination(&req_id.0)?;

    let report = state
        .reconciler
        .run(upstream, &request.products, destination, &state.cancel)
        .await
        .map_err(|e| match e {
            ImportError::Authentication(source) => {
                tracing::warn!(error = %source, "import rejected: upstream authentication failed");
                ApiError::new(req_id.0.clone(), "upstream_auth_failed", source.to_string())
            }
        })?;

    Ok(ApiResponse::new(req_id.0, report))
}
