//! # Command Line Interface
//!
//! Operator tooling: read secrets the way a service would and inspect the
//! resolved configuration.
//!
//! ```text
//! servicekit secret get db-pwd                 # <app>/<env>/db-pwd
//! servicekit secret get-verbatim shared/token
//! servicekit secret get-binary cert            # base64 on stdout
//! servicekit config show
//! ```

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use base64::Engine;
use clap::{Parser, Subcommand};

use crate::app::Platform;
use crate::config::{Settings, CONFIG_PATH_ENV};
use crate::context::Context;
use crate::observability::try_init_logging;

#[derive(Parser)]
#[command(name = "servicekit")]
#[command(about = "Service bootstrap tooling: secrets lookup and configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (overrides SERVICEKIT_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Lookup timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Secret lookup commands
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SecretCommands {
    /// Read a secret by logical name, qualified with the configured prefix
    Get { name: String },

    /// Read a secret by fully qualified id
    GetVerbatim { id: String },

    /// Read a binary secret, printed as base64
    GetBinary { id: String },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the resolved configuration as JSON, credentials redacted
    Show,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));
    let mut settings =
        Settings::load_from(config_path.as_deref(), None).context("Failed to load configuration")?;
    if cli.verbose {
        settings.logging.level = "debug".to_string();
    }
    try_init_logging(&settings.logging)?;

    let mut stdout = std::io::stdout();
    execute(&cli, settings, &mut stdout).await
}

/// Execute a parsed command against `settings`, writing results to `out`.
pub async fn execute<W: Write>(cli: &Cli, settings: Settings, out: &mut W) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Config { command: ConfigCommands::Show } => {
            let shown = serde_json::to_string_pretty(&settings.redacted())?;
            writeln!(out, "{}", shown)?;
        }
        Commands::Secret { command } => {
            let platform = Platform::bootstrap(settings).await.context("Failed to initialize secrets")?;
            handle_secret_command(command, &platform, cli.timeout, out).await?;
        }
    }
    Ok(())
}

async fn handle_secret_command<W: Write>(
    command: &SecretCommands,
    platform: &Platform,
    timeout: Option<u64>,
    out: &mut W,
) -> anyhow::Result<()> {
    let ctx = match timeout {
        Some(secs) => Context::background().with_timeout(Duration::from_secs(secs)).0,
        None => Context::background(),
    };
    let secrets = platform.secrets();

    match command {
        SecretCommands::Get { name } => {
            let value = secrets.get_secret(&ctx, name).await?;
            writeln!(out, "{}", value)?;
        }
        SecretCommands::GetVerbatim { id } => {
            let value = secrets.get_secret_verbatim(&ctx, id).await?;
            writeln!(out, "{}", value)?;
        }
        SecretCommands::GetBinary { id } => {
            let value = secrets.get_binary_secret(&ctx, id).await?;
            writeln!(out, "{}", base64::engine::general_purpose::STANDARD.encode(value))?;
        }
    }
    Ok(())
}
