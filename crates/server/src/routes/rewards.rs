//! Rewards: issued by shopkeepers, claimed by customers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use localmart_core::RewardId;

use crate::error::{ApiJson, AppError};
use crate::middleware::{RequireAuth, RequireCustomer, RequireShopkeeper};
use crate::models::{Reward, RewardWithCustomer, RewardWithShop};
use crate::services::rewards::{RewardInput, RewardService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub reward_id: RewardId,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub message: &'static str,
    pub reward: Reward,
}

/// GET /api/rewards
///
/// # Errors
///
/// 500 if the query fails.
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiJson<Vec<RewardWithShop>>, AppError> {
    Ok(ApiJson(RewardService::new(state.pool()).for_customer(&user).await?))
}

/// POST /api/rewards
///
/// # Errors
///
/// 404 for an unknown reward, 403 if it was issued to someone else, 400
/// if it was already claimed or the balance is short.
pub async fn claim(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    ApiJson(req): ApiJson<ClaimRequest>,
) -> Result<ApiJson<ClaimResponse>, AppError> {
    let reward = RewardService::new(state.pool())
        .claim(&user, req.reward_id)
        .await?;
    Ok(ApiJson(ClaimResponse {
        message: "Reward claimed successfully",
        reward,
    }))
}

/// GET /api/shopkeeper/rewards
///
/// # Errors
///
/// 500 if the query fails.
pub async fn issued(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
) -> Result<ApiJson<Vec<RewardWithCustomer>>, AppError> {
    Ok(ApiJson(RewardService::new(state.pool()).for_shop(&user).await?))
}

/// POST /api/shopkeeper/rewards
///
/// # Errors
///
/// 400 for invalid fields or a non-customer target, 404 for an unknown
/// target or a missing shop.
pub async fn issue(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
    ApiJson(input): ApiJson<RewardInput>,
) -> Result<impl IntoResponse, AppError> {
    let reward = RewardService::new(state.pool()).issue(&user, input).await?;
    Ok((StatusCode::CREATED, ApiJson(reward)))
}
