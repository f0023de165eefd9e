//! Error types for the stub layer.

use thiserror::Error;

/// Errors raised while setting up clients or reading descriptors.
#[derive(Debug, Error)]
pub enum Error {
    /// The blocking runtime could not be started
    #[error("Failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// Connecting the channel failed
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The embedded descriptor set did not decode
    #[error("Invalid file descriptor set: {0}")]
    Descriptor(#[from] prost::DecodeError),

    /// No compiled schema file has this name
    #[error("Schema file {0} is not in the descriptor set")]
    FileNotFound(String),
}
