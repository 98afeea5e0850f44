//! User management commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use schoolhub_core::config::AppConfig;
use schoolhub_core::error::AppError;
use schoolhub_entity::user::{CreateUser, User, UserRole};
use schoolhub_service::RequestContext;

/// Arguments for the user command
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user and open their credit account
    Create {
        /// Email address
        #[arg(long)]
        email: String,
        /// Full name
        #[arg(long)]
        name: String,
        /// Full name in Bengali
        #[arg(long)]
        name_bn: Option<String>,
        /// Role (super_admin, admin, teacher, student, parent)
        #[arg(long, default_value = "teacher")]
        role: UserRole,
        /// School membership
        #[arg(long)]
        school: Option<Uuid>,
    },
    /// Show a user by id or email
    Show {
        /// User id or email
        user: String,
    },
    /// Deactivate a user
    Deactivate {
        /// User id
        id: Uuid,
    },
}

/// User display row
#[derive(Debug, Serialize, Tabled)]
struct UserRow {
    /// ID
    id: String,
    /// Email
    email: String,
    /// Name
    name: String,
    /// Role
    role: String,
    /// Status
    status: String,
    /// School
    school: String,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            name: user.full_name.clone(),
            role: user.role.to_string(),
            status: user.status.to_string(),
            school: user
                .school_id
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::create_services(config).await?;
    let ctx = RequestContext::system();

    match &args.command {
        UserCommand::Create {
            email,
            name,
            name_bn,
            role,
            school,
        } => {
            let (user, balance) = services
                .users
                .create(
                    &ctx,
                    CreateUser {
                        id: None,
                        email: email.clone(),
                        full_name: name.clone(),
                        full_name_bn: name_bn.clone(),
                        role: *role,
                        school_id: *school,
                    },
                )
                .await?;
            output::print_success(&format!(
                "User '{}' created with {} credits",
                user.email, balance.current_credits
            ));
            output::print_item(UserRow::from(&user), format);
        }
        UserCommand::Show { user } => {
            let found = match Uuid::parse_str(user) {
                Ok(id) => services.users.find(id).await?,
                Err(_) => services.users.find_by_email(user).await?,
            };
            output::print_item(UserRow::from(&found), format);
        }
        UserCommand::Deactivate { id } => {
            let user = services.users.deactivate(&ctx, *id).await?;
            output::print_success(&format!("User '{}' deactivated", user.email));
        }
    }

    Ok(())
}
