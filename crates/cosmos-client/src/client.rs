//! Async client over one shared channel.

use crate::account::Account;
use crate::error::ClientError;
use crate::pagination::{paginate, DEFAULT_PAGE_LIMIT};
use cosmos_proto::cosmos::{
    auth::v1beta1 as auth, authz::v1beta1 as authz, bank::v1beta1 as bank,
    base::reflection::v1beta1 as reflection, base::reflection::v2alpha1 as app_reflection,
    base::tendermint::v1beta1 as tendermint, base::v1beta1::Coin,
    distribution::v1beta1 as distribution, evidence::v1beta1 as evidence,
    feegrant::v1beta1 as feegrant, gov::v1beta1 as gov, group::v1beta1 as group,
    mint::v1beta1 as mint, nft::v1beta1 as nft, slashing::v1beta1 as slashing,
    staking::v1beta1 as staking, tx::v1beta1 as tx, upgrade::v1beta1 as upgrade,
    vesting::v1beta1 as vesting,
};
use cosmos_proto::tendermint::abci;
use std::time::Duration;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

/// Connect timeout applied to new endpoints.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Cosmos gRPC client
///
/// Cloning is cheap; every clone shares the underlying channel.
#[derive(Debug, Clone)]
pub struct CosmosClient {
    endpoint: String,
    channel: Channel,
}

impl CosmosClient {
    /// Connect to a node, failing if it cannot be reached.
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let endpoint = endpoint.into();
        let channel = Self::endpoint(&endpoint)?.connect().await?;
        debug!(endpoint = %endpoint, "Connected");
        Ok(Self { endpoint, channel })
    }

    /// Create a client that connects on first use.
    pub fn connect_lazy(endpoint: impl Into<String>) -> Result<Self, ClientError> {
        let endpoint = endpoint.into();
        let channel = Self::endpoint(&endpoint)?.connect_lazy();
        Ok(Self { endpoint, channel })
    }

    /// Wrap an existing channel.
    pub fn from_channel(endpoint: impl Into<String>, channel: Channel) -> Self {
        Self {
            endpoint: endpoint.into(),
            channel,
        }
    }

    fn endpoint(endpoint: &str) -> Result<Endpoint, ClientError> {
        Endpoint::from_shared(endpoint.to_string())
            .map(|e| e.connect_timeout(DEFAULT_CONNECT_TIMEOUT))
            .map_err(|e| ClientError::InvalidEndpoint(format!("{endpoint}: {e}")))
    }

    /// Endpoint URI this client talks to.
    pub fn endpoint_uri(&self) -> &str {
        &self.endpoint
    }

    /// Underlying channel.
    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    /// `cosmos.auth.v1beta1.Query`: accounts and auth parameters.
    pub fn auth(&self) -> auth::query_client::QueryClient<Channel> {
        auth::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.authz.v1beta1.Query`: grants between accounts.
    pub fn authz(&self) -> authz::query_client::QueryClient<Channel> {
        authz::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.authz.v1beta1.Msg`.
    pub fn authz_msg(&self) -> authz::msg_client::MsgClient<Channel> {
        authz::msg_client::MsgClient::new(self.channel())
    }

    /// `cosmos.bank.v1beta1.Query`: balances, supply and denom metadata.
    pub fn bank(&self) -> bank::query_client::QueryClient<Channel> {
        bank::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.bank.v1beta1.Msg`.
    pub fn bank_msg(&self) -> bank::msg_client::MsgClient<Channel> {
        bank::msg_client::MsgClient::new(self.channel())
    }

    /// `cosmos.distribution.v1beta1.Query`: rewards, commission and the community pool.
    pub fn distribution(&self) -> distribution::query_client::QueryClient<Channel> {
        distribution::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.distribution.v1beta1.Msg`.
    pub fn distribution_msg(&self) -> distribution::msg_client::MsgClient<Channel> {
        distribution::msg_client::MsgClient::new(self.channel())
    }

    /// `cosmos.evidence.v1beta1.Query`.
    pub fn evidence(&self) -> evidence::query_client::QueryClient<Channel> {
        evidence::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.feegrant.v1beta1.Query`: fee allowances.
    pub fn feegrant(&self) -> feegrant::query_client::QueryClient<Channel> {
        feegrant::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.feegrant.v1beta1.Msg`.
    pub fn feegrant_msg(&self) -> feegrant::msg_client::MsgClient<Channel> {
        feegrant::msg_client::MsgClient::new(self.channel())
    }

    /// `cosmos.gov.v1beta1.Query`: proposals, votes, deposits and tallies.
    pub fn gov(&self) -> gov::query_client::QueryClient<Channel> {
        gov::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.gov.v1beta1.Msg`.
    pub fn gov_msg(&self) -> gov::msg_client::MsgClient<Channel> {
        gov::msg_client::MsgClient::new(self.channel())
    }

    /// `cosmos.group.v1beta1.Query`: groups, policies and their proposals.
    pub fn group(&self) -> group::query_client::QueryClient<Channel> {
        group::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.group.v1beta1.Msg`.
    pub fn group_msg(&self) -> group::msg_client::MsgClient<Channel> {
        group::msg_client::MsgClient::new(self.channel())
    }

    /// `cosmos.mint.v1beta1.Query`: inflation and annual provisions.
    pub fn mint(&self) -> mint::query_client::QueryClient<Channel> {
        mint::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.nft.v1beta1.Query`.
    pub fn nft(&self) -> nft::query_client::QueryClient<Channel> {
        nft::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.slashing.v1beta1.Query`: signing infos and slashing parameters.
    pub fn slashing(&self) -> slashing::query_client::QueryClient<Channel> {
        slashing::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.staking.v1beta1.Query`: validators, delegations and the pool.
    pub fn staking(&self) -> staking::query_client::QueryClient<Channel> {
        staking::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.staking.v1beta1.Msg`.
    pub fn staking_msg(&self) -> staking::msg_client::MsgClient<Channel> {
        staking::msg_client::MsgClient::new(self.channel())
    }

    /// `cosmos.tx.v1beta1.Service`: simulate, broadcast and look up transactions.
    pub fn tx_service(&self) -> tx::service_client::ServiceClient<Channel> {
        tx::service_client::ServiceClient::new(self.channel())
    }

    /// `cosmos.upgrade.v1beta1.Query`: upgrade plans and module versions.
    pub fn upgrade(&self) -> upgrade::query_client::QueryClient<Channel> {
        upgrade::query_client::QueryClient::new(self.channel())
    }

    /// `cosmos.vesting.v1beta1.Msg`.
    pub fn vesting_msg(&self) -> vesting::msg_client::MsgClient<Channel> {
        vesting::msg_client::MsgClient::new(self.channel())
    }

    /// `cosmos.base.reflection.v1beta1.ReflectionService`: interface registry.
    pub fn reflection(
        &self,
    ) -> reflection::reflection_service_client::ReflectionServiceClient<Channel> {
        reflection::reflection_service_client::ReflectionServiceClient::new(self.channel())
    }

    /// `cosmos.base.reflection.v2alpha1.ReflectionService`: app, chain and codec descriptors.
    pub fn app_reflection(
        &self,
    ) -> app_reflection::reflection_service_client::ReflectionServiceClient<Channel> {
        app_reflection::reflection_service_client::ReflectionServiceClient::new(self.channel())
    }

    /// `cosmos.base.tendermint.v1beta1.Service`: blocks, validator sets and node info.
    pub fn tendermint(&self) -> tendermint::service_client::ServiceClient<Channel> {
        tendermint::service_client::ServiceClient::new(self.channel())
    }

    /// `tendermint.abci.ABCIApplication`, for nodes that expose ABCI over gRPC.
    pub fn abci(&self) -> abci::abci_application_client::AbciApplicationClient<Channel> {
        abci::abci_application_client::AbciApplicationClient::new(self.channel())
    }

    /// Balance of one denomination; zero when the account holds none.
    pub async fn balance(&self, address: &str, denom: &str) -> Result<Coin, ClientError> {
        let response = self
            .bank()
            .balance(bank::QueryBalanceRequest {
                address: address.to_string(),
                denom: denom.to_string(),
            })
            .await?
            .into_inner();

        Ok(response.balance.unwrap_or_else(|| Coin::new(denom, 0)))
    }

    /// Every balance of an account, across all pages.
    pub async fn all_balances(&self, address: &str) -> Result<Vec<Coin>, ClientError> {
        let client = self.bank();
        paginate(DEFAULT_PAGE_LIMIT, |page| {
            let mut client = client.clone();
            let request = bank::QueryAllBalancesRequest {
                address: address.to_string(),
                pagination: Some(page),
            };
            async move {
                let response = client.all_balances(request).await?.into_inner();
                Ok((response.balances, response.pagination))
            }
        })
        .await
    }

    /// Decoded account at `address`.
    pub async fn account(&self, address: &str) -> Result<Account, ClientError> {
        let response = self
            .auth()
            .account(auth::QueryAccountRequest {
                address: address.to_string(),
            })
            .await?
            .into_inner();

        let any = response.account.ok_or(ClientError::MissingField("account"))?;
        Account::from_any(&any)
    }

    /// Node and application version information.
    pub async fn node_info(&self) -> Result<tendermint::GetNodeInfoResponse, ClientError> {
        Ok(self
            .tendermint()
            .get_node_info(tendermint::GetNodeInfoRequest {})
            .await?
            .into_inner())
    }

    /// Height of the latest committed block.
    pub async fn latest_height(&self) -> Result<i64, ClientError> {
        let response = self
            .tendermint()
            .get_latest_block(tendermint::GetLatestBlockRequest {})
            .await?
            .into_inner();

        response
            .block
            .as_ref()
            .and_then(|block| block.height())
            .ok_or(ClientError::MissingField("block.header"))
    }

    /// Whether the node is still catching up.
    pub async fn syncing(&self) -> Result<bool, ClientError> {
        Ok(self
            .tendermint()
            .get_syncing(tendermint::GetSyncingRequest {})
            .await?
            .into_inner()
            .syncing)
    }

    /// Transaction and its execution result by hash.
    pub async fn tx(&self, hash: &str) -> Result<tx::GetTxResponse, ClientError> {
        let response = self
            .tx_service()
            .get_tx(tx::GetTxRequest {
                hash: hash.to_string(),
            })
            .await?
            .into_inner();

        if response.tx_response.is_none() {
            return Err(ClientError::NotFound(format!("transaction {}", hash)));
        }
        Ok(response)
    }

    /// Interface names registered on the node.
    pub async fn interfaces(&self) -> Result<Vec<String>, ClientError> {
        Ok(self
            .reflection()
            .list_all_interfaces(reflection::ListAllInterfacesRequest {})
            .await?
            .into_inner()
            .interface_names)
    }

    /// Type URLs implementing `interface` on the node.
    pub async fn implementations(&self, interface: &str) -> Result<Vec<String>, ClientError> {
        Ok(self
            .reflection()
            .list_implementations(reflection::ListImplementationsRequest {
                interface_name: interface.to_string(),
            })
            .await?
            .into_inner()
            .implementation_message_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_endpoint() {
        let result = CosmosClient::connect_lazy("not a uri");
        assert!(matches!(result, Err(ClientError::InvalidEndpoint(_))));
    }

    #[tokio::test]
    async fn test_connect_lazy_keeps_endpoint() {
        let client = CosmosClient::connect_lazy("http://127.0.0.1:9090").unwrap();
        assert_eq!(client.endpoint_uri(), "http://127.0.0.1:9090");
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let result = CosmosClient::connect("http://127.0.0.1:1").await;
        assert!(matches!(result, Err(ClientError::Connection(_))));
    }
}
