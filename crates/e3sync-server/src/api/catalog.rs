use axum::{
    extract::{Query, State},
    Extension, Json,
};
use e3sync_upstream::{Category, ProductFilter, ProductPage};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_upstream_error, ApiError, ApiResponse, AppState};

const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub category: Option<String>,
    pub query: Option<String>,
    pub in_stock: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub(super) fn normalize_limit(limit: Option<u32>, default: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_LIMIT)
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<ProductPage>>, ApiError> {
    let upstream = state.upstream(&req_id.0)?;
    let filter = ProductFilter {
        category: query.category,
        query: query.query,
        in_stock: query.in_stock.unwrap_or(false),
        code: None,
    };
    let page = upstream
        .fetch_products(
            &filter,
            query.page.unwrap_or(1),
            normalize_limit(query.limit, state.page_limit),
        )
        .await
        .map_err(|e| map_upstream_error(req_id.0.clone(), &e))?;

    Ok(ApiResponse::new(req_id.0, page))
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryItem {
    code: Option<String>,
    name: Option<String>,
}

impl From<&Category> for CategoryItem {
    fn from(category: &Category) -> Self {
        Self {
            code: category.code(),
            name: category.name(),
        }
    }
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryItem>>>, ApiError> {
    let upstream = state.upstream(&req_id.0)?;
    let categories = upstream
        .fetch_categories()
        .await
        .map_err(|e| map_upstream_error(req_id.0.clone(), &e))?;

    let data = categories.iter().map(CategoryItem::from).collect();
    Ok(ApiResponse::new(req_id.0, data))
}
