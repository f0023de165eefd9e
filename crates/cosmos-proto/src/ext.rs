//! Convenience methods on generated messages.

use crate::cosmos::base::abci::v1beta1::TxResponse;
use crate::cosmos::base::query::v1beta1::{PageRequest, PageResponse};
use crate::cosmos::base::v1beta1::Coin;
use crate::tendermint::types::Block;
use std::fmt;

impl Coin {
    /// Build a coin from a denomination and an integer amount.
    pub fn new(denom: impl Into<String>, amount: impl ToString) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.to_string(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl PageRequest {
    /// Request the page that starts at `key`.
    pub fn after(key: Vec<u8>, limit: u64) -> Self {
        Self {
            key,
            limit,
            ..Default::default()
        }
    }
}

impl PageResponse {
    /// Whether the server reported a further page.
    pub fn has_next(&self) -> bool {
        !self.next_key.is_empty()
    }
}

impl TxResponse {
    /// Whether the transaction executed successfully.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl Block {
    /// Height from the block header, if present.
    pub fn height(&self) -> Option<i64> {
        self.header.as_ref().map(|header| header.height)
    }
}
