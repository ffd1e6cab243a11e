//! Seed shopkeepers, shops and products from a YAML file.
//!
//! ```yaml
//! shopkeepers:
//!   - name: Priya
//!     email: priya@example.com
//!     password: corner-store-2024
//!     shop:
//!       name: Corner Store
//!       address: 12 Market Road
//!       lat: 12.9716
//!       lng: 77.5946
//!       rewardRate: "0.1"
//!     products:
//!       - name: Masala Chai
//!         price: "120.00"
//!         stock: 40
//!         category: Tea
//! ```
//!
//! The file is parsed and validated before any connection is made. Users
//! that already exist are skipped along with their shop and products, so
//! re-running a seed is harmless.

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info, warn};

use localmart_core::{Email, GeoPoint, MAX_AMOUNT, RewardRate, Role};
use localmart_server::db::{self, UserRepository};
use localmart_server::models::CurrentUser;
use localmart_server::services::auth::{AuthService, validate_name};
use localmart_server::services::catalog::{CatalogService, ProductInput, ShopInput};

/// Top-level seed document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    #[serde(default)]
    pub shopkeepers: Vec<ShopkeeperSeed>,
}

/// One shopkeeper with their shop and catalog.
#[derive(Debug, Deserialize)]
pub struct ShopkeeperSeed {
    pub name: String,
    pub email: String,
    pub password: String,
    pub shop: ShopInput,
    #[serde(default)]
    pub products: Vec<ProductInput>,
}

/// What a seed run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub shopkeepers_created: usize,
    pub shopkeepers_skipped: usize,
    pub products_created: usize,
}

/// Check the whole document, returning every problem found.
#[must_use]
pub fn validate_config(config: &SeedConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (i, seed) in config.shopkeepers.iter().enumerate() {
        let at = format!("shopkeepers[{i}]");

        if validate_name(&seed.name).is_err() {
            errors.push(format!("{at}.name is empty or too long"));
        }
        match Email::parse(&seed.email) {
            Ok(email) => {
                if !seen.insert(email.as_str().to_owned()) {
                    errors.push(format!("{at}.email {email} appears twice"));
                }
            }
            Err(e) => errors.push(format!("{at}.email: {e}")),
        }
        if seed.password.len() < 8 {
            errors.push(format!("{at}.password must be at least 8 characters"));
        }

        if seed.shop.name.trim().is_empty() {
            errors.push(format!("{at}.shop.name is required"));
        }
        if seed.shop.address.trim().is_empty() {
            errors.push(format!("{at}.shop.address is required"));
        }
        if let Err(e) = GeoPoint::new(seed.shop.lat, seed.shop.lng) {
            errors.push(format!("{at}.shop: {e}"));
        }
        if let Some(Err(e)) = seed.shop.reward_rate.map(RewardRate::new) {
            errors.push(format!("{at}.shop.rewardRate: {e}"));
        }

        for (j, product) in seed.products.iter().enumerate() {
            let at = format!("{at}.products[{j}]");
            if product.name.trim().is_empty() {
                errors.push(format!("{at}.name is required"));
            }
            if product.price.is_sign_negative() {
                errors.push(format!("{at}.price cannot be negative"));
            }
            if product.price > MAX_AMOUNT {
                errors.push(format!("{at}.price must be at most {MAX_AMOUNT}"));
            }
            if product.stock < 0 {
                errors.push(format!("{at}.stock cannot be negative"));
            }
        }
    }

    errors
}

/// Seed the catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails
/// validation, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let config: SeedConfig = serde_yaml::from_str(&content)?;

    info!(shopkeepers = config.shopkeepers.len(), "Parsed configuration");

    let errors = validate_config(&config);
    if !errors.is_empty() {
        error!("Configuration validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!("Configuration validated successfully");

    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let summary = seed(&pool, config).await?;

    info!("Seeding complete!");
    info!("  Shopkeepers created: {}", summary.shopkeepers_created);
    info!("  Shopkeepers skipped (already exist): {}", summary.shopkeepers_skipped);
    info!("  Products created: {}", summary.products_created);

    Ok(())
}

async fn seed(
    pool: &sqlx::PgPool,
    config: SeedConfig,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let auth = AuthService::new(pool);
    let users = UserRepository::new(pool);
    let catalog = CatalogService::new(pool);
    let mut summary = SeedSummary::default();

    for seed in config.shopkeepers {
        let email = Email::parse(&seed.email)?;
        if users.get_by_email(&email).await?.is_some() {
            warn!(email = %email, "User exists, skipping");
            summary.shopkeepers_skipped += 1;
            continue;
        }

        let user = auth
            .register(&seed.name, email.as_str(), &seed.password, Role::Shopkeeper)
            .await?;
        let current = CurrentUser::from(&user);
        let shop = catalog.setup_shop(&current, seed.shop).await?;
        info!(shop_id = %shop.id, name = %shop.name, "Shop created");
        summary.shopkeepers_created += 1;

        for product in seed.products {
            catalog.create_product(&current, product).await?;
            summary.products_created += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VALID: &str = r#"
shopkeepers:
  - name: Priya
    email: priya@example.com
    password: corner-store-2024
    shop:
      name: Corner Store
      address: 12 Market Road
      lat: 12.9716
      lng: 77.5946
      rewardRate: "0.1"
    products:
      - name: Masala Chai
        price: "120.00"
        stock: 40
        category: Tea
      - name: Filter Coffee
        price: 95
        stock: 0
"#;

    #[test]
    fn test_valid_file_parses_and_validates() {
        let config: SeedConfig = serde_yaml::from_str(VALID).unwrap();
        assert_eq!(config.shopkeepers.len(), 1);
        let seed = config.shopkeepers.first().unwrap();
        assert_eq!(seed.products.len(), 2);
        assert_eq!(
            seed.products.first().unwrap().price,
            rust_decimal::Decimal::new(12_000, 2)
        );
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn test_problems_are_all_reported() {
        let yaml = r#"
shopkeepers:
  - name: ""
    email: not-an-email
    password: short
    shop:
      name: Stall
      address: ""
      lat: 100
      lng: 0
    products:
      - name: Bad
        price: "-1"
        stock: -3
"#;
        let config: SeedConfig = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 7, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("shop.address")));
        assert!(errors.iter().any(|e| e.contains("products[0].stock")));
    }

    #[test]
    fn test_duplicate_emails_rejected() {
        let one = r"
  - name: A
    email: a@example.com
    password: longenough
    shop: {name: S, address: X, lat: 0, lng: 0}
";
        let yaml = format!("shopkeepers:{one}{}", one.replace("name: A", "name: B"));
        let config: SeedConfig = serde_yaml::from_str(&yaml).unwrap();
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors.first().unwrap().contains("appears twice"));
    }

    #[test]
    fn test_amounts_beyond_column_bounds_rejected() {
        let yaml = r#"
shopkeepers:
  - name: Priya
    email: priya@example.com
    password: corner-store-2024
    shop: {name: S, address: X, lat: 0, lng: 0, rewardRate: "10000"}
    products:
      - name: Gold Tea
        price: "100000000000"
        stock: 1
"#;
        let config: SeedConfig = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_config(&config);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("shop.rewardRate")));
        assert!(errors.iter().any(|e| e.contains("products[0].price")));
    }

    #[test]
    fn test_unknown_top_level_key_is_an_error() {
        assert!(serde_yaml::from_str::<SeedConfig>("customers: []").is_err());
    }
}
