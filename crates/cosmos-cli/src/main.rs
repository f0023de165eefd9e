//! cosmos-grpc - command-line interface for the Cosmos SDK gRPC services.

use clap::Parser;
use cosmos_cli::{Cli, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> cosmos_cli::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("cosmos_client=debug,info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let output = cosmos_cli::execute(cli, &mut config).await?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
