//! Cosmos Rust client
//!
//! Client library for the Cosmos SDK gRPC services.
//!
//! # Example
//!
//! ```no_run
//! use cosmos_client::CosmosClient;
//!
//! # async fn run() -> Result<(), cosmos_client::ClientError> {
//! let client = CosmosClient::connect("http://localhost:9090").await?;
//!
//! let height = client.latest_height().await?;
//! let balances = client.all_balances("cosmos1...").await?;
//! println!("{height}: {balances:?}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod account;
mod blocking;
mod client;
mod error;
pub mod pagination;

pub use account::Account;
pub use blocking::BlockingCosmosClient;
pub use client::{CosmosClient, DEFAULT_CONNECT_TIMEOUT};
pub use cosmos_proto;
pub use error::ClientError;
pub use pagination::paginate;
