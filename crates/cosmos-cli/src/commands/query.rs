//! Query command implementation.

use crate::cli::{QueryArgs, QueryTarget};
use crate::error::Result;
use crate::output::Formatter;
use cosmos_client::CosmosClient;

/// Execute a node query.
pub async fn execute_query(
    args: QueryArgs,
    client: &CosmosClient,
    formatter: &Formatter,
) -> Result<String> {
    match args.target {
        QueryTarget::Balance { address, denom } => {
            let coin = client.balance(&address, &denom).await?;
            formatter.format_coins(&[coin])
        }
        QueryTarget::Balances { address } => {
            let coins = client.all_balances(&address).await?;
            formatter.format_coins(&coins)
        }
        QueryTarget::Account { address } => {
            let account = client.account(&address).await?;
            formatter.format_account(&account)
        }
        QueryTarget::NodeInfo => {
            let info = client.node_info().await?;
            formatter.format_node_info(&info)
        }
        QueryTarget::LatestBlock => {
            let height = client.latest_height().await?;
            formatter.format_details(&[("height", height.to_string())])
        }
        QueryTarget::Syncing => {
            let syncing = client.syncing().await?;
            formatter.format_details(&[("syncing", syncing.to_string())])
        }
        QueryTarget::Tx { hash } => {
            let tx = client.tx(&hash).await?;
            formatter.format_tx(&tx)
        }
    }
}
