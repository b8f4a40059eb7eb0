//! hlte: highlight ingestion daemon
//!
//! Receives highlights from the browser extension and persists them to
//! every requested format.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hlte::{
    config::{Config, LogFormat, LoggingConfig},
    daemon::Daemon,
    sink::SinkFormat,
};
use sha2::{Digest, Sha512};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "hlte")]
#[command(about = "Highlight ingestion daemon")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Data directory (overrides config and environment)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon
    Serve,

    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Print the SHA-512 hex of a passphrase for `auth.passphrase_sha512`
    HashPassphrase {
        passphrase: String,
    },

    /// List supported formats
    Formats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // A broken config still gets reported through the default subscriber
    let config = Config::load_or_default(&cli.config);
    let logging = match &config {
        Ok(config) => config.logging.clone(),
        Err(_) => LoggingConfig::default(),
    };
    init_tracing(&logging, cli.verbose)?;
    let config = config?;

    match cli.command {
        Commands::Serve => serve(config, cli.data_dir).await,
        Commands::Init { path } => init_config(&path),
        Commands::HashPassphrase { passphrase } => {
            println!("{}", hash_passphrase(&passphrase));
            Ok(())
        }
        Commands::Formats => {
            for format in SinkFormat::ALL {
                println!("{}", format);
            }
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let log_level: Level = logging.level.more_verbose(verbose).into();

    match logging.format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(log_level)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .json()
                .with_max_level(log_level)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

async fn serve(config: Config, data_dir: Option<PathBuf>) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| config.storage.resolve_data_dir());
    let daemon = Daemon::start(config, &data_dir).await?;
    daemon.run().await
}

fn init_config(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create '{}'", path.display()))?;
    let config_path = path.join("config.toml");
    if config_path.exists() {
        anyhow::bail!("Config file already exists: {}", config_path.display());
    }

    let toml_content = format!(
        "# hlte daemon configuration\n# Set auth.passphrase_sha512 with `hlte hash-passphrase <passphrase>`\n\n{}",
        Config::default().to_toml()?
    );
    std::fs::write(&config_path, toml_content)
        .with_context(|| format!("Failed to write '{}'", config_path.display()))?;

    info!("Created config file: {}", config_path.display());
    Ok(())
}

fn hash_passphrase(passphrase: &str) -> String {
    hex::encode(Sha512::digest(passphrase.as_bytes()))
}
