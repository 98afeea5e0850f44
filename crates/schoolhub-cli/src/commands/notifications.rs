//! Notification maintenance commands.

use clap::{Args, Subcommand};
use dialoguer::Confirm;

use crate::output;
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;

/// Arguments for the notifications command
#[derive(Debug, Args)]
pub struct NotificationsArgs {
    /// Notifications subcommand
    #[command(subcommand)]
    pub command: NotificationsCommand,
}

/// Notifications subcommands
#[derive(Debug, Subcommand)]
pub enum NotificationsCommand {
    /// Delete notifications older than the retention window
    Prune {
        /// Retention in days (defaults to the configured value)
        #[arg(long)]
        days: Option<i64>,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Execute notifications commands
pub async fn execute(args: &NotificationsArgs, config: &AppConfig) -> Result<(), AppError> {
    match &args.command {
        NotificationsCommand::Prune { days, force } => {
            let days = days.unwrap_or(config.notifications.retention_days);
            if !force {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete notifications older than {} days?", days))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Prompt failed: {e}")))?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let services = super::create_services(config).await?;
            let removed = services.notifications.prune(days).await?;
            output::print_success(&format!("Removed {} notification(s)", removed));
        }
    }

    Ok(())
}
