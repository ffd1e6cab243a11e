//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;

/// Database URL from `LOCALMART_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns a message naming both variables when neither is set.
pub fn database_url() -> Result<SecretString, &'static str> {
    dotenvy::dotenv().ok();
    std::env::var("LOCALMART_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "LOCALMART_DATABASE_URL (or DATABASE_URL) not set")
}
