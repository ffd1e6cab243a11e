//! Shop analytics report.

use axum::extract::State;

use crate::error::{ApiJson, AppError};
use crate::middleware::RequireShopkeeper;
use crate::services::analytics::{AnalyticsReport, AnalyticsService};
use crate::state::AppState;

/// POST /api/analytics
///
/// Narrative sections fall back to placeholder text when the insights
/// service is unavailable; that never fails the request.
///
/// # Errors
///
/// 404 when the shopkeeper has no shop.
pub async fn report(
    State(state): State<AppState>,
    RequireShopkeeper(user): RequireShopkeeper,
) -> Result<ApiJson<AnalyticsReport>, AppError> {
    let report = AnalyticsService::new(state.pool(), state.insights())
        .report(&user)
        .await?;
    Ok(ApiJson(report))
}
