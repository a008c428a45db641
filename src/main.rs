use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use doc_ledger::config::{ServerConfig, StorageConfig, DEV_SECRET};
use doc_ledger::crypto::hash;
use doc_ledger::error::{LedgerError, Result};
use doc_ledger::server::{self, auth, AppState};

#[derive(Parser)]
#[command(name = "doc-ledger")]
#[command(about = "Document intake backend with a tamper-evident integrity ledger")]
#[command(version)]
struct Cli {
    /// Log filter (e.g. "info", "doc_ledger=debug")
    #[arg(long, global = true, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(ServerConfig),
    /// Verify ledger integrity (exit code 2 if the chain is broken)
    Verify(StorageConfig),
    /// Show ledger length and tip
    Status(StorageConfig),
    /// Print the SHA-256 of a file
    Hash {
        file: PathBuf,
    },
    /// Issue a session token for a user
    Token {
        #[arg(long)]
        user: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value_t = auth::DEFAULT_TOKEN_TTL_HOURS)]
        ttl_hours: u64,
        #[arg(long, env = "SECRET_KEY", default_value = DEV_SECRET, hide_env_values = true)]
        jwt_secret: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!(kind = e.kind(), error = %e, "doc-ledger failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Serve(config) => {
            if config.uses_dev_secret() {
                warn!("Using the development JWT secret; set SECRET_KEY in production");
            }
            let anchor = config.storage.anchor_service()?;
            info!(
                chain_file = %config.storage.chain_file.display(),
                blocks = anchor.chain().len()?,
                "Ledger opened"
            );
            let state = AppState {
                anchor,
                jwt_secret: config.jwt_secret,
            };
            server::serve(state, &config.bind).await?;
        }
        Commands::Verify(storage) => {
            let report = storage.open_chain()?.verify_report()?;
            print_json(&report)?;
            if !report.valid {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::Status(storage) => {
            let chain = storage.open_chain()?;
            let blocks = chain.blocks()?;
            print_json(&serde_json::json!({
                "length": blocks.len(),
                "tip": blocks.last(),
            }))?;
        }
        Commands::Hash { file } => {
            println!("{}  {}", hash::hash_file(&file)?, file.display());
        }
        Commands::Token {
            user,
            email,
            ttl_hours,
            jwt_secret,
        } => {
            println!(
                "{}",
                auth::issue_token(&user, email.as_deref(), &jwt_secret, ttl_hours)?
            );
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;
    println!("{out}");
    Ok(())
}
