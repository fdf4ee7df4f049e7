use clap::{Parser, Subcommand};
use rustmq_console::admin::{AclEditor, ConsoleApiClient};
use rustmq_console::{ConsoleConfig, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

mod console;

use console::{execute_acl_command, execute_user_command, AclCommands, Output, OutputFormat, UserCommands};

#[derive(Parser)]
#[command(name = "rustmq-console")]
#[command(about = "RustMQ Console - ACL and service account management")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Console API base URL (overrides the config file)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Output format: table, json, yaml or csv (overrides the config file)
    #[arg(long)]
    pub format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// ACL management commands
    #[command(subcommand)]
    Acl(AclCommands),

    /// Service account management commands
    #[command(subcommand)]
    Users(UserCommands),
}

/// Merge the config file, if any, with command-line overrides.
fn resolve_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = match &cli.config {
        Some(path) => ConsoleConfig::from_file(path)?,
        None => ConsoleConfig::default(),
    };

    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    if cli.no_color {
        config.output.no_color = true;
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: &Cli, config: ConsoleConfig, out: &Output) -> Result<()> {
    let client = ConsoleApiClient::from_config(&config.api)?;
    debug!("Using console API at {}", client.base_url());

    let mut editor = AclEditor::new(Arc::new(client), config.acl.clone());

    match &cli.command {
        Commands::Acl(cmd) => execute_acl_command(cmd, &mut editor, out).await,
        Commands::Users(cmd) => execute_user_command(cmd, &editor, out).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let fallback = Output {
        format: cli.format.unwrap_or(OutputFormat::Table),
        no_color: cli.no_color,
    };

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            fallback.error(&e.to_string());
            std::process::exit(1);
        }
    };

    let out = Output {
        format: match cli.format {
            Some(format) => format,
            None => config.output.format.parse().unwrap_or(OutputFormat::Table),
        },
        no_color: config.output.no_color,
    };

    if let Err(e) = run(&cli, config, &out).await {
        out.error(&e.to_string());
        std::process::exit(1);
    }
}
