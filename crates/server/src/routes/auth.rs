//! Registration, login and logout.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use localmart_core::{Role, UserId};

use crate::error::{ApiJson, AppError};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Registration body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user_id: UserId,
}

/// Login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// POST /api/auth/register
///
/// # Errors
///
/// 400 for an unknown role or invalid fields, 409 if the email is taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let role: Role = req
        .role
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("role must be 'customer' or 'shopkeeper'".to_string()))?;

    let user = AuthService::new(state.pool())
        .register(&req.name, &req.email, &req.password, role)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiJson(RegisterResponse {
            message: "User registered successfully",
            user_id: user.id,
        }),
    ))
}

/// POST /api/auth/login
///
/// # Errors
///
/// 401 for unknown email or wrong password.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<ApiJson<User>, AppError> {
    let user = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await?;

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(ApiJson(user))
}

/// POST /api/auth/logout
///
/// # Errors
///
/// 500 if the session store cannot be updated.
pub async fn logout(session: Session) -> Result<ApiJson<MessageResponse>, AppError> {
    clear_current_user(&session).await?;
    Ok(ApiJson(MessageResponse {
        message: "Logged out",
    }))
}
