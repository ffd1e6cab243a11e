//! Product catalog.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use localmart_core::{ProductId, ShopId};

use crate::error::{ApiJson, ApiPath, ApiQuery, AppError};
use crate::middleware::RequireShopkeeper;
use crate::models::{Product, ProductWithShop};
use crate::services::catalog::{CatalogService, ProductInput, ProductPatch};
use crate::state::AppState;

/// `?search=&shopId=` on the product list.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub search: Option<String>,
    pub shop_id: Option<ShopId>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

/// GET /api/products
///
/// # Errors
///
/// 500 if the query fails.
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<ApiJson<Vec<ProductWithShop>>, AppError> {
    let products = CatalogService::new(state.pool())
        .products(query.search.as_deref(), query.shop_id)
        .await?;
    Ok(ApiJson(products))
}

/// GET /api/products/{id}
///
/// # Errors
///
/// 404 for an unknown product.
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<ApiJson<ProductWithShop>, AppError> {
    Ok(ApiJson(CatalogService::new(state.pool()).product(id).await?))
}

/// POST /api/products
///
/// # Errors
///
/// 400 for invalid fields, 404 when the shopkeeper has no shop.
pub async fn create(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<impl IntoResponse, AppError> {
    let product = CatalogService::new(state.pool())
        .create_product(&user, input)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(product)))
}

/// PUT /api/products/{id}
///
/// # Errors
///
/// 403 unless the caller owns the product's shop.
pub async fn update(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<ApiJson<Product>, AppError> {
    let product = CatalogService::new(state.pool())
        .update_product(&user, id, patch)
        .await?;
    Ok(ApiJson(product))
}

/// DELETE /api/products/{id}
///
/// # Errors
///
/// 403 unless the caller owns the product's shop.
pub async fn delete(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<ApiJson<Deleted>, AppError> {
    CatalogService::new(state.pool()).delete_product(&user, id).await?;
    Ok(ApiJson(Deleted {
        message: "Product deleted successfully",
    }))
}
