//! Cosmos gRPC Server
//!
//! Serves the Cosmos SDK module services. Interface reflection and gRPC
//! server reflection have real implementations; everything else answers
//! `UNIMPLEMENTED`.

use clap::Parser;
use cosmos_grpc_server::config::ServerConfig;
use cosmos_grpc_server::services::ServiceSet;
use cosmos_grpc_server::{init_tracing, start_server, ServerError};
use std::path::PathBuf;
use std::process;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(name = "cosmos-grpc-server")]
#[command(about = "Serve the Cosmos SDK gRPC services", long_about = None)]
#[command(version)]
struct Args {
    /// Load configuration from TOML file
    #[arg(long, env = "COSMOS_GRPC_CONFIG")]
    config: Option<PathBuf>,

    /// gRPC listen address (overrides config)
    #[arg(long)]
    grpc_address: Option<String>,

    /// HTTP catalog listen address (overrides config)
    #[arg(long)]
    http_address: Option<String>,

    /// Leave a service unmounted (repeatable)
    #[arg(long = "disable", value_name = "SERVICE")]
    disabled_services: Vec<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(addr) = args.grpc_address {
        config.grpc_address = addr;
    }
    if args.http_address.is_some() {
        config.http_address = args.http_address;
    }
    config.disabled_services.extend(args.disabled_services);
    config.validate()?;

    init_tracing(&config.log_filter);
    if args.config.is_none() {
        warn!("No config file specified, using defaults");
    }

    let services = ServiceSet::with_reflection(config.disabled_services.clone())?;
    start_server(config, services, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
