//! Authentication extractors.
//!
//! Each extractor resolves the session's [`CurrentUser`] for one request and
//! hands it to the handler, which passes it on to the services explicitly.
//! A missing session is `401`; a session with the wrong role is `403`.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use localmart_core::Role;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires any logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn me(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a logged-in customer.
pub struct RequireCustomer(pub CurrentUser);

/// Extractor that requires a logged-in shopkeeper.
pub struct RequireShopkeeper(pub CurrentUser);

async fn current_user(parts: &Parts) -> Result<CurrentUser, AppError> {
    // Set by SessionManagerLayer
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))?;

    let user: CurrentUser = session
        .get(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| AppError::Unauthorized("not logged in".to_string()))?;

    tracing::Span::current().record("user_id", user.id.as_i32());
    set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));
    Ok(user)
}

fn require_role(user: CurrentUser, role: Role) -> Result<CurrentUser, AppError> {
    if user.role == role {
        Ok(user)
    } else {
        Err(AppError::Forbidden(format!("{role} access required")))
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await?;
        require_role(user, Role::Customer).map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireShopkeeper
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await?;
        require_role(user, Role::Shopkeeper).map(Self)
    }
}

/// Store the logged-in user in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await?;
    set_sentry_user(user.id.as_i32(), Some(user.email.as_str()));
    Ok(())
}

/// Log out: drop the whole session.
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use localmart_core::{Email, UserId};

    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: Email::parse("ada@example.com").unwrap(),
            name: "Ada".to_string(),
            role,
        }
    }

    #[test]
    fn test_role_match() {
        assert!(require_role(user(Role::Customer), Role::Customer).is_ok());
        let err = require_role(user(Role::Customer), Role::Shopkeeper).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();
        let err = RequireAuth::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
