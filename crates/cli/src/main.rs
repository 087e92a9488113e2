//! Dulce Arte CLI - database migrations, seeding and admin users.
//!
//! # Usage
//!
//! ```bash
//! # Apply the embedded migrations
//! da-cli migrate
//!
//! # Default categories, settings and the first admin
//! da-cli seed --admin-password '...'
//!
//! # Another admin user
//! da-cli admin create -u maria -e maria@reposteria.com -n "María" --password '...'
//! ```
//!
//! # Environment Variables
//!
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//! - `DA_ADMIN_PASSWORD` - default for `--admin-password` / `--password`

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use dulce_arte_api::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_NAME, DEFAULT_ADMIN_USERNAME};

mod commands;

use commands::CommandError;
use commands::seed::SeedAdmin;

#[derive(Parser)]
#[command(name = "da-cli")]
#[command(author, version, about = "Dulce Arte CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed default categories, settings and the admin user
    Seed {
        /// Admin password (at least 8 characters)
        #[arg(long, env = "DA_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: String,

        #[arg(long, default_value = DEFAULT_ADMIN_USERNAME)]
        admin_username: String,

        #[arg(long, default_value = DEFAULT_ADMIN_EMAIL)]
        admin_email: String,

        #[arg(long, default_value = DEFAULT_ADMIN_NAME)]
        admin_name: String,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Login name (letters, digits, `.`, `_`, `-`)
        #[arg(short, long)]
        username: String,

        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Display name; defaults to the username
        #[arg(short, long, default_value = "")]
        name: String,

        /// Password (at least 8 characters)
        #[arg(long, env = "DA_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed {
            admin_password,
            admin_username,
            admin_email,
            admin_name,
        } => {
            commands::seed::run(&SeedAdmin {
                username: &admin_username,
                email: &admin_email,
                name: &admin_name,
                password: &admin_password,
            })
            .await?;
        }
        Commands::Admin { action } => match action {
            AdminAction::Create {
                username,
                email,
                name,
                password,
            } => {
                commands::admin::create_user(&username, &email, &name, &password).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_defaults() {
        let cli = Cli::try_parse_from(["da-cli", "seed", "--admin-password", "admin123"]);
        let Ok(Cli {
            command:
                Commands::Seed {
                    admin_username,
                    admin_email,
                    ..
                },
        }) = cli
        else {
            panic!("seed should parse");
        };
        assert_eq!(admin_username, "admin");
        assert_eq!(admin_email, "admin@reposteria.com");
    }

    #[test]
    fn test_admin_create_short_flags() {
        let cli = Cli::try_parse_from([
            "da-cli", "admin", "create", "-u", "maria", "-e", "maria@example.com", "--password",
            "s3cret-pass",
        ]);
        assert!(matches!(
            cli,
            Ok(Cli {
                command: Commands::Admin {
                    action: AdminAction::Create { .. }
                }
            })
        ));
    }
}
