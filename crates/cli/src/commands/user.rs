//! User management commands.
//!
//! ```bash
//! lm-cli user create -e ada@example.com -n "Ada" -r shopkeeper -p 'long passphrase'
//! ```

use thiserror::Error;
use uuid::Uuid;

use localmart_core::Role;
use localmart_server::db;
use localmart_server::services::auth::{AuthError, AuthService};

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid role: {0}. Valid roles: customer, shopkeeper")]
    InvalidRole(String),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a user with an Argon2-hashed password.
///
/// When no password is given a random one is generated and printed once.
///
/// # Errors
///
/// Returns `UserError` for an unknown role, invalid fields, a taken email,
/// or a database failure.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: Option<String>,
) -> Result<i32, UserError> {
    let role: Role = role
        .trim()
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))?;

    let database_url = super::database_url().map_err(UserError::MissingEnvVar)?;

    let (password, generated) = match password {
        Some(p) => (p, false),
        None => (Uuid::new_v4().simple().to_string(), true),
    };

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Creating user: {} ({})", email, role);
    let user = AuthService::new(&pool)
        .register(name, email, &password, role)
        .await?;

    tracing::info!("User created with ID: {}", user.id);
    if generated {
        #[allow(clippy::print_stdout)]
        {
            println!("Generated password for {}: {password}", user.email);
        }
    }

    Ok(user.id.as_i32())
}
