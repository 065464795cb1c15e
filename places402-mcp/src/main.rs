//! MCP server binary for the x402 Places API.
//!
//! # Usage
//!
//! ```bash
//! # Demo mode (no wallet)
//! cargo run -p places402-mcp
//!
//! # Paid searches
//! PRIVATE_KEY=0x... cargo run -p places402-mcp --release
//!
//! # Configure logging level
//! RUST_LOG=debug cargo run -p places402-mcp
//! ```
//!
//! Stdout carries the MCP protocol; all logs go to stderr.

use std::sync::Arc;

use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing_subscriber::EnvFilter;

use places402_mcp::config::{Args, Settings};
use places402_mcp::{Dispatcher, PlacesServer};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    if let Err(e) = run().await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_args(Args::parse());
    let dispatcher = Dispatcher::from_settings(settings)?;
    tracing::info!(
        payment_enabled = dispatcher.capability().payment_enabled(),
        base_url = dispatcher.settings().base_url(),
        endpoint = dispatcher.settings().endpoint_path(),
        "Places MCP server starting"
    );

    let service = PlacesServer::new(Arc::new(dispatcher))
        .serve(stdio())
        .await?;
    service.waiting().await?;

    tracing::info!("MCP host disconnected, shutting down");
    Ok(())
}
