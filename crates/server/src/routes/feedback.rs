//! Order feedback.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use localmart_core::{OrderId, Rating};

use crate::error::{ApiJson, ApiQuery, AppError};
use crate::middleware::{RequireAuth, RequireCustomer};
use crate::models::Feedback;
use crate::services::feedback::{FeedbackInput, FeedbackListing, FeedbackService};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Submitted {
    pub message: &'static str,
    pub feedback: Feedback,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckQuery {
    pub order_id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct ExistingFeedback {
    pub rating: Rating,
    pub comment: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackCheck {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<ExistingFeedback>,
}

/// POST /api/feedback
///
/// # Errors
///
/// 400 for invalid fields or an order that is not completed, 403 for
/// someone else's order, 404 for an unknown order, 409 for a second rating.
pub async fn submit(
    State(state): State<AppState>,
    RequireCustomer(user): RequireCustomer,
    ApiJson(input): ApiJson<FeedbackInput>,
) -> Result<impl IntoResponse, AppError> {
    let feedback = FeedbackService::new(state.pool()).submit(&user, input).await?;
    Ok((
        StatusCode::CREATED,
        ApiJson(Submitted {
            message: "Feedback submitted successfully",
            feedback,
        }),
    ))
}

/// GET /api/feedback
///
/// # Errors
///
/// 500 if the query fails.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiJson<FeedbackListing>, AppError> {
    Ok(ApiJson(FeedbackService::new(state.pool()).list(&user).await?))
}

/// GET /api/feedback/check?orderId=
///
/// # Errors
///
/// 400 without an order id, 403 if the feedback belongs to someone else.
pub async fn check(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiQuery(query): ApiQuery<CheckQuery>,
) -> Result<ApiJson<FeedbackCheck>, AppError> {
    let existing = FeedbackService::new(state.pool())
        .for_order(&user, query.order_id)
        .await?;
    Ok(ApiJson(FeedbackCheck {
        exists: existing.is_some(),
        feedback: existing.map(|f| ExistingFeedback {
            rating: f.rating,
            comment: f.comment,
        }),
    }))
}
