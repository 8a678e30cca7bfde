mod analyze_cmd;
mod status_cmd;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing::instrument::WithSubscriber;

use receiptforge_config::{load_and_prepare, redact, ReceiptForgeConfig};
use receiptforge_gateway::{start_server, GatewayState};
use receiptforge_logging::{bootstrap_dispatch, init_logger};

#[derive(Parser)]
#[command(name = "receiptforge")]
#[command(about = "ReceiptForge: extract receipt data from images with Gemini")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $RECEIPTFORGE_CONFIG or ~/.receiptforge/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Query a running gateway's health endpoint
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Analyze a receipt image file and print the extracted JSON
    Analyze {
        file: PathBuf,
        /// Gemini API key (overrides GEMINI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_and_prepare(cli.config.as_deref())
        .with_subscriber(bootstrap_dispatch())
        .await?;

    let log_dir = config.logging.dir.as_ref().map(PathBuf::from);
    let _guard = init_logger(config.logging.level(), config.logging.json(), log_dir.as_deref());

    match cli.command {
        Commands::Serve { port } => run_server(config, port).await?,
        Commands::Status { port } => {
            status_cmd::run(port.unwrap_or(config.gateway.port())).await?;
        }
        Commands::Analyze { file, api_key } => {
            let ok = analyze_cmd::run(&config, &file, api_key).await?;
            if !ok {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn run_server(mut config: ReceiptForgeConfig, port: Option<u16>) -> Result<()> {
    if let Some(port) = port {
        config.gateway.port = Some(port);
    }

    let snapshot = serde_json::to_value(&config).context("Failed to serialize config")?;
    info!(config = %redact(&snapshot), "Loaded configuration");

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind(), config.gateway.port())
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.gateway.bind()))?;

    let state = GatewayState::from_config(&config)?;
    start_server(addr, state, config.gateway.cors_permissive()).await
}
