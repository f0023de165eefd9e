//! Cosmos gRPC Server
//!
//! Hosts the Cosmos SDK module services over tonic. Services without a real
//! implementation answer `UNIMPLEMENTED`; an optional axum listener serves a
//! JSON catalog of what is mounted.

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod reflection;
pub mod services;

use catalog::{create_router, CatalogState};
use config::ServerConfig;
use cosmos_proto::Registry;
use services::ServiceSet;
use std::future::Future;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::codegen::http;
use tonic::transport::Server;
use tracing::{error, info, info_span, warn, Span};
use tracing_subscriber::EnvFilter;

pub use reflection::InterfaceReflection;
pub use services::{ServiceEntry, ServiceStatus};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// gRPC transport error
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// HTTP catalog error
    #[error("HTTP server error: {0}")]
    Http(String),

    /// The reflection service could not load the descriptor set
    #[error("Reflection setup failed: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter`. Does nothing if a subscriber is
/// already installed.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Bind the configured addresses and serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: ServerConfig,
    services: ServiceSet,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    config.validate()?;

    let grpc_listener = TcpListener::bind(config.grpc_addr()?).await?;
    let http_listener = match config.http_addr()? {
        Some(addr) => Some(TcpListener::bind(addr).await?),
        None => None,
    };

    serve(config, services, grpc_listener, http_listener, shutdown).await
}

/// Serve on already-bound listeners until `shutdown` resolves.
pub async fn serve<F>(
    config: ServerConfig,
    services: ServiceSet,
    grpc_listener: TcpListener,
    http_listener: Option<TcpListener>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (routes, entries) = services.build();

    info!("Starting Cosmos gRPC server");
    info!("gRPC address: {}", grpc_listener.local_addr()?);
    for entry in &entries {
        info!(
            service = entry.descriptor.full_name(),
            status = ?entry.status,
            "Registered service"
        );
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown.await;
        info!("Shutdown requested");
        let _ = stop_tx.send(true);
    });

    let mut builder = Server::builder();
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }
    if let Some(limit) = config.concurrency_limit_per_connection {
        builder = builder.concurrency_limit_per_connection(limit);
    }

    let grpc = builder
        .trace_fn(request_span)
        .add_routes(routes)
        .serve_with_incoming_shutdown(
            TcpListenerStream::new(grpc_listener),
            stopped(stop_rx.clone()),
        );
    let grpc = async move { grpc.await.map_err(ServerError::from) };

    match http_listener {
        Some(listener) => {
            info!("HTTP catalog address: {}", listener.local_addr()?);
            let app = create_router(CatalogState::new(entries));
            let http = async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(stopped(stop_rx))
                    .await
                    .map_err(|e| ServerError::Http(e.to_string()))
            };
            serve_both(grpc, http).await?;
        }
        None => grpc.await?,
    }

    info!("Server stopped");
    Ok(())
}

/// Run both listeners to completion. The first error drops the other one.
async fn serve_both<G, H>(grpc: G, http: H) -> Result<(), ServerError>
where
    G: Future<Output = Result<(), ServerError>>,
    H: Future<Output = Result<(), ServerError>>,
{
    tokio::try_join!(grpc, http).map(|_| ()).inspect_err(|e| {
        error!("Listener failed, stopping server: {}", e);
    })
}

async fn stopped(mut stop: watch::Receiver<bool>) {
    while !*stop.borrow() {
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Span for one incoming request, labelled with the resolved method.
fn request_span(request: &http::Request<()>) -> Span {
    let path = request.uri().path();
    match Registry::global().resolve(path) {
        Some((service, method)) => {
            if method.deprecated() {
                warn!(method = method.full_method_name(), "Deprecated method called");
            }
            info_span!(
                "grpc",
                service = service.full_name(),
                method = method.name(),
                method_id = method.id(),
            )
        }
        None => info_span!("grpc", path = %path),
    }
}
