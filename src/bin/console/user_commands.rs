use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::debug;

use rustmq_console::admin::{AclEditor, CreateUserRequest, ScramMechanism};
use rustmq_console::Result;

use super::formatters::{confirm_operation, Output};

#[derive(Subcommand)]
pub enum UserCommands {
    /// List service accounts
    List,
    /// Create a SCRAM service account
    Create(UserCreateCommand),
    /// Delete a service account
    Delete(UserDeleteCommand),
}

#[derive(Args)]
pub struct UserCreateCommand {
    pub username: String,
    #[arg(long)]
    pub password: String,
    /// SCRAM-SHA-256 or SCRAM-SHA-512
    #[arg(long, default_value = "SCRAM-SHA-256")]
    pub mechanism: ScramMechanism,
}

#[derive(Args)]
pub struct UserDeleteCommand {
    pub username: String,
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct UserRow {
    username: String,
}

pub async fn execute_user_command(cmd: &UserCommands, editor: &AclEditor, out: &Output) -> Result<()> {
    match cmd {
        UserCommands::List => {
            debug!("Listing service accounts");
            let users = editor.backend().list_service_accounts().await?;
            if users.is_empty() {
                out.info("No service accounts found");
            } else {
                let rows: Vec<UserRow> = users.into_iter().map(|username| UserRow { username }).collect();
                out.print(&rows)?;
            }
        }
        UserCommands::Create(args) => {
            let request = CreateUserRequest::new(&args.username, &args.password, args.mechanism)?;
            editor.create_service_account(&request).await?;
            out.success(&format!(
                "Service account '{}' created ({})",
                request.username, request.mechanism
            ));
        }
        UserCommands::Delete(args) => {
            if !args.yes && !confirm_operation("delete service account", &args.username) {
                out.info("Operation cancelled");
                return Ok(());
            }
            editor.delete_service_account(&args.username).await?;
            out.success(&format!("Service account '{}' deleted", args.username));
        }
    }

    Ok(())
}
