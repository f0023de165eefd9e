//! Blocking wrapper around [`CosmosClient`].

use crate::account::Account;
use crate::client::CosmosClient;
use crate::error::ClientError;
use cosmos_proto::cosmos::base::tendermint::v1beta1::GetNodeInfoResponse;
use cosmos_proto::cosmos::base::v1beta1::Coin;
use cosmos_proto::cosmos::tx::v1beta1::GetTxResponse;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Blocking Cosmos gRPC client
///
/// Drives [`CosmosClient`] on a runtime it owns (or shares). Must not be
/// used from inside an async context.
#[derive(Debug, Clone)]
pub struct BlockingCosmosClient {
    inner: CosmosClient,
    runtime: Arc<Runtime>,
}

impl BlockingCosmosClient {
    /// Connect to a node on a fresh single-worker runtime.
    pub fn connect(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let runtime = cosmos_proto::blocking::runtime()?;
        let inner = runtime.block_on(CosmosClient::connect(endpoint))?;
        Ok(Self { inner, runtime })
    }

    /// Wrap an async client, driving it on `runtime`.
    pub fn with_runtime(inner: CosmosClient, runtime: Arc<Runtime>) -> Self {
        Self { inner, runtime }
    }

    /// The async client underneath.
    pub fn inner(&self) -> &CosmosClient {
        &self.inner
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// See [`CosmosClient::balance`].
    pub fn balance(&self, address: &str, denom: &str) -> Result<Coin, ClientError> {
        self.block_on(self.inner.balance(address, denom))
    }

    /// See [`CosmosClient::all_balances`].
    pub fn all_balances(&self, address: &str) -> Result<Vec<Coin>, ClientError> {
        self.block_on(self.inner.all_balances(address))
    }

    /// See [`CosmosClient::account`].
    pub fn account(&self, address: &str) -> Result<Account, ClientError> {
        self.block_on(self.inner.account(address))
    }

    /// See [`CosmosClient::node_info`].
    pub fn node_info(&self) -> Result<GetNodeInfoResponse, ClientError> {
        self.block_on(self.inner.node_info())
    }

    /// See [`CosmosClient::latest_height`].
    pub fn latest_height(&self) -> Result<i64, ClientError> {
        self.block_on(self.inner.latest_height())
    }

    /// See [`CosmosClient::syncing`].
    pub fn syncing(&self) -> Result<bool, ClientError> {
        self.block_on(self.inner.syncing())
    }

    /// See [`CosmosClient::tx`].
    pub fn tx(&self, hash: &str) -> Result<GetTxResponse, ClientError> {
        self.block_on(self.inner.tx(hash))
    }

    /// See [`CosmosClient::interfaces`].
    pub fn interfaces(&self) -> Result<Vec<String>, ClientError> {
        self.block_on(self.inner.interfaces())
    }

    /// See [`CosmosClient::implementations`].
    pub fn implementations(&self, interface: &str) -> Result<Vec<String>, ClientError> {
        self.block_on(self.inner.implementations(interface))
    }
}
