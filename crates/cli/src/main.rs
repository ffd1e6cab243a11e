//! Localmart CLI - database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run marketplace and session-store migrations
//! lm-cli migrate
//!
//! # Seed shopkeepers, shops and products from YAML
//! lm-cli seed seeds/demo.yaml
//!
//! # Create a user
//! lm-cli user create -e ada@example.com -n "Ada" -r shopkeeper -p 'long passphrase'
//! ```
//!
//! All commands read `LOCALMART_DATABASE_URL` (or `DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "lm-cli")]
#[command(author, version, about = "Localmart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations (schema and session store)
    Migrate,
    /// Seed shopkeepers, shops and products from a YAML file
    Seed {
        /// Path to the YAML seed file
        file: String,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Create a new user
    Create {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Role (`customer`, `shopkeeper`)
        #[arg(short, long, default_value = "customer")]
        role: String,

        /// Password; a random one is generated and printed when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::catalog(&file).await?,
        Commands::User { action } => match action {
            UserAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::user::create_user(&email, &name, &role, password).await?;
            }
        },
    }
    Ok(())
}
