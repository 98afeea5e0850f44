//! Session token tools for local testing against the API.

use chrono::Duration;
use clap::{Args, Subcommand};

use crate::output;
use schoolhub_auth::JwtEncoder;
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use uuid::Uuid;

/// Arguments for the token command
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Issue a bearer token for an existing user
    Issue {
        /// User id
        user: Uuid,
        /// Lifetime in minutes (defaults to the configured TTL)
        #[arg(long)]
        ttl_minutes: Option<i64>,
    },
}

/// Execute token commands
pub async fn execute(args: &TokenArgs, config: &AppConfig) -> Result<(), AppError> {
    match &args.command {
        TokenCommand::Issue { user, ttl_minutes } => {
            let services = super::create_services(config).await?;
            let account = services.users.find(*user).await?;
            if !account.can_login() {
                return Err(AppError::validation(format!(
                    "User '{}' is not active",
                    account.email
                )));
            }

            let encoder = JwtEncoder::new(&config.auth);
            let ttl = ttl_minutes.unwrap_or(config.auth.token_ttl_minutes);
            if ttl <= 0 {
                return Err(AppError::validation("ttl must be positive"));
            }
            let issued = encoder.issue_with_ttl(
                account.id,
                account.role,
                account.school_id,
                Duration::minutes(ttl),
            )?;

            output::print_kv("User", &account.email);
            output::print_kv("Role", &account.role.to_string());
            output::print_kv("Expires", &issued.expires_at.to_rfc3339());
            println!("{}", issued.token);
        }
    }

    Ok(())
}
