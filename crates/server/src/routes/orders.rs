//! Order placement, listing and status updates.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use localmart_core::{OrderId, ShopId};

use crate::error::{ApiJson, ApiPath, ApiQuery, AppError};
use crate::middleware::{RequireAuth, RequireCustomer, RequireShopkeeper};
use crate::models::OrderDetails;
use crate::services::orders::{CartLine, OrderService};
use crate::state::AppState;

/// Checkout body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub shop_id: ShopId,
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// POST /api/orders
///
/// # Errors
///
/// 400 for an invalid cart or insufficient stock, 404 for an unknown shop
/// or product, 403 for shopkeepers.
pub async fn place(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    ApiJson(req): ApiJson<PlaceOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order = OrderService::new(state.pool())
        .place(&user, req.shop_id, &req.items)
        .await?;
    Ok((StatusCode::CREATED, ApiJson(order)))
}

/// GET /api/orders?status=
///
/// # Errors
///
/// 400 for an unknown status.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> Result<ApiJson<Vec<OrderDetails>>, AppError> {
    let orders = OrderService::new(state.pool())
        .list(&user, query.status.as_deref())
        .await?;
    Ok(ApiJson(orders))
}

/// GET /api/orders/{id}
///
/// # Errors
///
/// 404 for an unknown order, 403 unless the caller bought it or owns the shop.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<ApiJson<OrderDetails>, AppError> {
    Ok(ApiJson(OrderService::new(state.pool()).get(&user, id).await?))
}

/// PUT /api/orders/{id}
///
/// # Errors
///
/// 400 for an unknown status or an illegal transition, 403 unless the
/// caller owns the order's shop.
pub async fn update_status(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<StatusUpdate>,
) -> Result<ApiJson<OrderDetails>, AppError> {
    let order = OrderService::new(state.pool())
        .update_status(&user, id, &req.status)
        .await?;
    Ok(ApiJson(order))
}
