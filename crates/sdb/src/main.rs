//! SDB - SQL Script Debugger
//!
//! A step-through debugger for SQL scripts with a simulated execution
//! backend, speaking a DAP-style protocol over WebSocket.

use clap::{Parser, Subcommand};
use eyre::Result;
use sdb_adapter::{start_server, ServerConfig};
use tracing::info;

/// Command-line interface for SDB
#[derive(Debug, Parser)]
#[command(name = "sdb")]
#[command(about = "SQL Script Debugger - a step-through debugger for SQL scripts")]
#[command(version)]
pub struct Cli {
    /// Log filter directive used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the debug adapter server
    Serve {
        /// Port for the WebSocket debug adapter
        #[arg(long, env = "SDB_PORT", default_value = "8765")]
        port: u16,

        /// Reject unrecognized commands instead of acknowledging them
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    sdb_common::logging::init_logging(&cli.log);

    match cli.command {
        Commands::Serve { port, strict } => {
            let config = ServerConfig { port, strict, ..ServerConfig::default() };
            let handle = start_server(config).await?;
            info!("sdb debug adapter ready on {}", handle.url());

            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            handle.shutdown()?;
        }
    }

    Ok(())
}
