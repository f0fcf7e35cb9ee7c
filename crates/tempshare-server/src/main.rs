use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use tempshare_server::config::ServerConfig;

#[derive(Parser)]
#[command(name = "tempshare-server", version, about = "Temporary file sharing server")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve,
    /// Run one expiration sweep and print the report
    Sweep,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let state = tempshare_server::build_state(&cli.config).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Sweep => {
            let report = state.service.sweep().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Serve => {
            if let Some(secs) = cli.config.sweep_interval_secs {
                tokio::spawn(tempshare_server::sweeper::run_sweeper(state.clone(), secs));
            }

            let addr = cli.config.addr()?;
            let listener = TcpListener::bind(addr).await?;
            tracing::info!("tempshare-server listening on http://{addr}");

            tempshare_server::serve(listener, state).await?;
        }
    }

    Ok(())
}
