//! Shop setup, shopkeeper profile and the public shop directory.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use localmart_core::GeoPoint;

use crate::db::shops::ShopStats;
use crate::error::{ApiJson, ApiQuery, AppError};
use crate::middleware::RequireShopkeeper;
use crate::models::{Shop, ShopListing};
use crate::routes::users::Profile;
use crate::services::auth::AuthService;
use crate::services::catalog::{CatalogService, ShopInput, ShopPatch};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ShopCheck {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop: Option<Shop>,
}

#[derive(Debug, Serialize)]
pub struct ShopkeeperProfile {
    pub user: Profile,
    pub shop: Shop,
}

/// `?lat=&lng=` on the directory.
#[derive(Debug, Default, Deserialize)]
pub struct NearQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl NearQuery {
    /// Both coordinates, validated; `None` unless both are present.
    fn point(&self) -> Result<Option<GeoPoint>, AppError> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => GeoPoint::new(lat, lng)
                .map(Some)
                .map_err(|e| AppError::BadRequest(e.to_string())),
            _ => Ok(None),
        }
    }
}

/// POST /api/shop/setup
///
/// # Errors
///
/// 400 for invalid fields, 409 if the caller already has a shop.
pub async fn setup(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
    ApiJson(input): ApiJson<ShopInput>,
) -> Result<impl IntoResponse, AppError> {
    let shop = CatalogService::new(state.pool()).setup_shop(&user, input).await?;
    Ok((StatusCode::CREATED, ApiJson(shop)))
}

/// GET /api/shop/check
///
/// # Errors
///
/// 500 if the lookup fails.
pub async fn check(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
) -> Result<ApiJson<ShopCheck>, AppError> {
    let shop = CatalogService::new(state.pool()).shop_for(&user).await?;
    Ok(ApiJson(ShopCheck {
        exists: shop.is_some(),
        shop,
    }))
}

/// GET /api/shopkeeper/profile
///
/// # Errors
///
/// 404 when the shopkeeper has no shop yet.
pub async fn profile(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
) -> Result<ApiJson<ShopkeeperProfile>, AppError> {
    let shop = CatalogService::new(state.pool()).require_shop(&user).await?;
    let account = AuthService::new(state.pool()).profile(user.id).await?;
    Ok(ApiJson(ShopkeeperProfile {
        user: account.into(),
        shop,
    }))
}

/// PUT /api/shopkeeper/profile
///
/// # Errors
///
/// 400 for invalid fields, 404 when there is no shop.
pub async fn update_profile(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
    ApiJson(patch): ApiJson<ShopPatch>,
) -> Result<ApiJson<Shop>, AppError> {
    let shop = CatalogService::new(state.pool()).update_shop(&user, patch).await?;
    Ok(ApiJson(shop))
}

/// GET /api/shopkeeper/stats
///
/// # Errors
///
/// 500 if an aggregate query fails.
pub async fn stats(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
) -> Result<ApiJson<ShopStats>, AppError> {
    Ok(ApiJson(CatalogService::new(state.pool()).stats(&user).await?))
}

/// GET /api/shops?lat=&lng=
///
/// # Errors
///
/// 400 for out-of-range coordinates.
pub async fn directory(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NearQuery>,
) -> Result<ApiJson<Vec<ShopListing>>, AppError> {
    let near = query.point()?;
    Ok(ApiJson(CatalogService::new(state.pool()).directory(near).await?))
}
