pub mod config;
pub mod constants;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod protocol;
pub mod register;
pub mod server;
pub mod tika;
pub mod tools;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use crate::config::{load_config, Config};
use crate::constants::REGISTERED_SERVER_ID;
use crate::extractor::TikaExtractor;
use crate::register::{default_client_config_path, register_server, ServerEntry};

#[derive(Parser)]
#[command(name = "tika-mcp")]
#[command(about = "MCP server exposing Apache Tika metadata and text extraction over stdio")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/tika-mcp/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive; RUST_LOG still takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON-RPC over stdin/stdout (the default)
    Serve,

    /// Add this server to an MCP client configuration file
    Register {
        /// MCP client config file (default: ~/.mcp/config.json)
        #[arg(long)]
        config_path: Option<PathBuf>,

        /// Command the client should run (default: this executable)
        #[arg(long)]
        command: Option<String>,

        /// Working directory for the server (default: current directory)
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("[FATAL ERROR] Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(run(cli));
    // A stdin read may still be parked on the blocking pool after a signal
    runtime.shutdown_background();

    if let Err(e) = result {
        eprintln!("[FATAL ERROR] Server crashed: {}", e);
        eprintln!("[FATAL ERROR] Error chain: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let _guard = logging::init_tracing(level, config.log_file.as_deref())?;

    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&config).await,
        Commands::Register {
            config_path,
            command,
            cwd,
        } => register(config_path, command, cwd),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn serve(config: &Config) -> Result<()> {
    let extractor = TikaExtractor::new(config.request_timeout());

    tokio::select! {
        result = server::run_server(extractor) => result,
        _ = shutdown_signal() => {
            info!("Received shutdown signal, exiting");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

fn register(config_path: Option<PathBuf>, command: Option<String>, cwd: Option<PathBuf>) -> Result<()> {
    let config_path = match config_path {
        Some(path) => path,
        None => default_client_config_path()?,
    };
    let command = match command {
        Some(command) => command,
        None => std::env::current_exe()
            .context("Failed to locate the tika-mcp executable")?
            .to_string_lossy()
            .to_string(),
    };
    let cwd = match cwd {
        Some(cwd) => cwd,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    let entry = ServerEntry::new(command, &cwd);
    register_server(&config_path, &entry)?;

    println!(
        "Registered Tika MCP server with ID '{}' in {}",
        REGISTERED_SERVER_ID,
        config_path.display()
    );
    println!("Command: {}", entry.command);
    println!("Working directory: {}", entry.cwd);
    Ok(())
}
