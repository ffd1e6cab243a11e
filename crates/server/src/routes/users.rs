//! The caller's own account.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use localmart_core::{Email, Role, UserId};

use crate::error::{ApiJson, AppError};
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Account as shown to its owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub reward_points: i64,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            reward_points: user.reward_points,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// GET /api/user/me
///
/// # Errors
///
/// 401 without a session, 404 if the account no longer exists.
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiJson<Profile>, AppError> {
    let account = AuthService::new(state.pool()).profile(user.id).await?;
    Ok(ApiJson(account.into()))
}

/// PUT /api/user/me
///
/// # Errors
///
/// 400 for an empty name.
pub async fn update_me(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ApiJson(req): ApiJson<RenameRequest>,
) -> Result<ApiJson<Profile>, AppError> {
    let account = AuthService::new(state.pool())
        .rename(user.id, &req.name)
        .await?;

    // Keep the session copy in step with the new name
    set_current_user(&session, &CurrentUser::from(&account)).await?;

    Ok(ApiJson(account.into()))
}
