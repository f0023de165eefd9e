//! Decoding of `Any`-packed accounts.

use crate::error::ClientError;
use cosmos_proto::cosmos::auth::v1beta1::{BaseAccount, ModuleAccount};
use cosmos_proto::cosmos::vesting::v1beta1::{
    BaseVestingAccount, ContinuousVestingAccount, DelayedVestingAccount, PeriodicVestingAccount,
    PermanentLockedAccount,
};
use prost::Name;
use prost_types::Any;

/// Every account type registered under the account interface.
#[derive(Debug, Clone, PartialEq)]
pub enum Account {
    /// Plain externally owned account
    Base(BaseAccount),
    /// Module-owned pool
    Module(ModuleAccount),
    /// Linearly vesting account
    ContinuousVesting(ContinuousVestingAccount),
    /// Account vesting in full at its end time
    DelayedVesting(DelayedVestingAccount),
    /// Account vesting over fixed periods
    PeriodicVesting(PeriodicVestingAccount),
    /// Account that never vests
    PermanentLocked(PermanentLockedAccount),
}

impl Account {
    /// Decode an account from its `Any` envelope.
    pub fn from_any(any: &Any) -> Result<Self, ClientError> {
        let url = any.type_url.as_str();
        let account = if url == BaseAccount::type_url() {
            Account::Base(any.to_msg()?)
        } else if url == ModuleAccount::type_url() {
            Account::Module(any.to_msg()?)
        } else if url == ContinuousVestingAccount::type_url() {
            Account::ContinuousVesting(any.to_msg()?)
        } else if url == DelayedVestingAccount::type_url() {
            Account::DelayedVesting(any.to_msg()?)
        } else if url == PeriodicVestingAccount::type_url() {
            Account::PeriodicVesting(any.to_msg()?)
        } else if url == PermanentLockedAccount::type_url() {
            Account::PermanentLocked(any.to_msg()?)
        } else {
            return Err(ClientError::UnknownAccountType(any.type_url.clone()));
        };
        Ok(account)
    }

    /// Short label for display.
    pub fn kind(&self) -> &'static str {
        match self {
            Account::Base(_) => "base",
            Account::Module(_) => "module",
            Account::ContinuousVesting(_) => "continuous-vesting",
            Account::DelayedVesting(_) => "delayed-vesting",
            Account::PeriodicVesting(_) => "periodic-vesting",
            Account::PermanentLocked(_) => "permanent-locked",
        }
    }

    /// The embedded base account, when present.
    pub fn base_account(&self) -> Option<&BaseAccount> {
        match self {
            Account::Base(account) => Some(account),
            Account::Module(account) => account.base_account.as_ref(),
            Account::ContinuousVesting(account) => vesting_base(&account.base_vesting_account),
            Account::DelayedVesting(account) => vesting_base(&account.base_vesting_account),
            Account::PeriodicVesting(account) => vesting_base(&account.base_vesting_account),
            Account::PermanentLocked(account) => vesting_base(&account.base_vesting_account),
        }
    }

    /// Bech32 address, when the base account is present.
    pub fn address(&self) -> Option<&str> {
        self.base_account().map(|account| account.address.as_str())
    }
}

fn vesting_base(account: &Option<BaseVestingAccount>) -> Option<&BaseAccount> {
    account.as_ref()?.base_account.as_ref()
}
