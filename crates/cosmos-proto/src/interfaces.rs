//! Interface registry: which concrete message types may be packed into an
//! `Any` field declared with a given Cosmos interface.

use crate::cosmos::{
    auth::v1beta1 as auth, authz::v1beta1 as authz, bank::v1beta1 as bank,
    crypto::{ed25519, multisig, secp256k1},
    distribution::v1beta1 as distribution, evidence::v1beta1 as evidence,
    feegrant::v1beta1 as feegrant, gov::v1beta1 as gov, group::v1beta1 as group,
    staking::v1beta1 as staking, upgrade::v1beta1 as upgrade, vesting::v1beta1 as vesting,
};
use prost::Name;
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Account interface implemented by every account type.
pub const ACCOUNT: &str = "cosmos.auth.v1beta1.AccountI";
/// Module account interface.
pub const MODULE_ACCOUNT: &str = "cosmos.auth.v1beta1.ModuleAccountI";
/// Authorization interface for authz grants.
pub const AUTHORIZATION: &str = "cosmos.authz.v1beta1.Authorization";
/// Transaction message interface.
pub const MSG: &str = "cosmos.base.v1beta1.Msg";
/// Public key interface.
pub const PUB_KEY: &str = "cosmos.crypto.PubKey";
/// Misbehaviour evidence interface.
pub const EVIDENCE: &str = "cosmos.evidence.v1beta1.Evidence";
/// Fee allowance interface.
pub const FEE_ALLOWANCE: &str = "cosmos.feegrant.v1beta1.FeeAllowanceI";
/// Governance proposal content interface.
pub const CONTENT: &str = "cosmos.gov.v1beta1.Content";
/// Group policy decision interface.
pub const DECISION_POLICY: &str = "cosmos.group.v1beta1.DecisionPolicy";

/// Maps interface names to the type URLs of their implementations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceRegistry {
    interfaces: BTreeMap<String, Vec<String>>,
}

impl InterfaceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of every interface known to this crate.
    pub fn global() -> &'static InterfaceRegistry {
        static REGISTRY: OnceLock<InterfaceRegistry> = OnceLock::new();
        REGISTRY.get_or_init(InterfaceRegistry::builtin)
    }

    fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register_interface(ACCOUNT);
        registry.register::<auth::BaseAccount>(ACCOUNT);
        registry.register::<auth::ModuleAccount>(ACCOUNT);
        registry.register::<vesting::ContinuousVestingAccount>(ACCOUNT);
        registry.register::<vesting::DelayedVestingAccount>(ACCOUNT);
        registry.register::<vesting::PeriodicVestingAccount>(ACCOUNT);
        registry.register::<vesting::PermanentLockedAccount>(ACCOUNT);
        registry.register::<auth::ModuleAccount>(MODULE_ACCOUNT);

        registry.register::<authz::GenericAuthorization>(AUTHORIZATION);
        registry.register::<bank::SendAuthorization>(AUTHORIZATION);

        registry.register::<bank::MsgSend>(MSG);
        registry.register::<bank::MsgMultiSend>(MSG);
        registry.register::<authz::MsgGrant>(MSG);
        registry.register::<authz::MsgExec>(MSG);
        registry.register::<authz::MsgRevoke>(MSG);
        registry.register::<feegrant::MsgGrantAllowance>(MSG);
        registry.register::<feegrant::MsgRevokeAllowance>(MSG);
        registry.register::<vesting::MsgCreateVestingAccount>(MSG);
        registry.register::<vesting::MsgCreatePeriodicVestingAccount>(MSG);
        registry.register::<distribution::MsgSetWithdrawAddress>(MSG);
        registry.register::<distribution::MsgWithdrawDelegatorReward>(MSG);
        registry.register::<distribution::MsgWithdrawValidatorCommission>(MSG);
        registry.register::<distribution::MsgFundCommunityPool>(MSG);
        registry.register::<gov::MsgSubmitProposal>(MSG);
        registry.register::<gov::MsgVote>(MSG);
        registry.register::<gov::MsgVoteWeighted>(MSG);
        registry.register::<gov::MsgDeposit>(MSG);
        registry.register::<staking::MsgCreateValidator>(MSG);
        registry.register::<staking::MsgEditValidator>(MSG);
        registry.register::<staking::MsgDelegate>(MSG);
        registry.register::<staking::MsgBeginRedelegate>(MSG);
        registry.register::<staking::MsgUndelegate>(MSG);
        registry.register::<group::MsgCreateGroup>(MSG);
        registry.register::<group::MsgUpdateGroupMembers>(MSG);
        registry.register::<group::MsgUpdateGroupAdmin>(MSG);
        registry.register::<group::MsgUpdateGroupMetadata>(MSG);
        registry.register::<group::MsgCreateGroupPolicy>(MSG);
        registry.register::<group::MsgUpdateGroupPolicyAdmin>(MSG);
        registry.register::<group::MsgUpdateGroupPolicyDecisionPolicy>(MSG);
        registry.register::<group::MsgUpdateGroupPolicyMetadata>(MSG);
        registry.register::<group::MsgCreateProposal>(MSG);
        registry.register::<group::MsgVote>(MSG);
        registry.register::<group::MsgExec>(MSG);

        registry.register::<secp256k1::PubKey>(PUB_KEY);
        registry.register::<ed25519::PubKey>(PUB_KEY);
        registry.register::<multisig::LegacyAminoPubKey>(PUB_KEY);

        registry.register::<evidence::Equivocation>(EVIDENCE);

        registry.register::<feegrant::BasicAllowance>(FEE_ALLOWANCE);
        registry.register::<feegrant::PeriodicAllowance>(FEE_ALLOWANCE);
        registry.register::<feegrant::AllowedMsgAllowance>(FEE_ALLOWANCE);

        registry.register::<upgrade::SoftwareUpgradeProposal>(CONTENT);
        registry.register::<upgrade::CancelSoftwareUpgradeProposal>(CONTENT);
        registry.register::<gov::TextProposal>(CONTENT);
        registry.register::<distribution::CommunityPoolSpendProposal>(CONTENT);

        registry.register::<group::ThresholdDecisionPolicy>(DECISION_POLICY);
        registry.register::<group::PercentageDecisionPolicy>(DECISION_POLICY);

        registry
    }

    /// Declare an interface with no implementations yet.
    pub fn register_interface(&mut self, interface: &str) {
        self.interfaces.entry(interface.to_string()).or_default();
    }

    /// Register `T` as an implementation of `interface`.
    pub fn register<T: Name>(&mut self, interface: &str) {
        self.register_type_url(interface, T::type_url());
    }

    /// Register a type URL as an implementation of `interface`.
    ///
    /// Registering the same type twice is a no-op.
    pub fn register_type_url(&mut self, interface: &str, type_url: impl Into<String>) {
        let type_url = type_url.into();
        let implementations = self.interfaces.entry(interface.to_string()).or_default();
        if !implementations.contains(&type_url) {
            implementations.push(type_url);
        }
    }

    /// Interface names, sorted.
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    /// Type URLs implementing `interface`, in registration order.
    pub fn implementations(&self, interface: &str) -> Option<&[String]> {
        self.interfaces.get(interface).map(Vec::as_slice)
    }

    /// Interfaces a type URL is registered under.
    pub fn interfaces_of<'a>(&'a self, type_url: &'a str) -> impl Iterator<Item = &'a str> {
        self.interfaces
            .iter()
            .filter(move |(_, implementations)| implementations.iter().any(|t| t == type_url))
            .map(|(interface, _)| interface.as_str())
    }

    /// Whether `type_url` may be packed where `interface` is expected.
    pub fn implements(&self, interface: &str, type_url: &str) -> bool {
        self.implementations(interface)
            .is_some_and(|implementations| implementations.iter().any(|t| t == type_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_interfaces() {
        let registry = InterfaceRegistry::global();
        let names: Vec<&str> = registry.interfaces().collect();
        assert_eq!(
            names,
            vec![
                ACCOUNT,
                MODULE_ACCOUNT,
                AUTHORIZATION,
                MSG,
                PUB_KEY,
                EVIDENCE,
                FEE_ALLOWANCE,
                CONTENT,
                DECISION_POLICY,
            ]
        );
    }

    #[test]
    fn test_account_implementations() {
        let registry = InterfaceRegistry::global();
        let accounts = registry.implementations(ACCOUNT).unwrap();
        assert_eq!(accounts[0], "/cosmos.auth.v1beta1.BaseAccount");
        assert_eq!(accounts.len(), 6);
        assert!(registry.implements(ACCOUNT, "/cosmos.vesting.v1beta1.PeriodicVestingAccount"));
        assert!(!registry.implements(ACCOUNT, "/cosmos.bank.v1beta1.MsgSend"));
    }

    #[test]
    fn test_interfaces_of_type_url() {
        let registry = InterfaceRegistry::global();
        let interfaces: Vec<&str> = registry
            .interfaces_of("/cosmos.auth.v1beta1.ModuleAccount")
            .collect();
        assert_eq!(interfaces, vec![ACCOUNT, MODULE_ACCOUNT]);
    }

    #[test]
    fn test_proposal_content_and_messages() {
        let registry = InterfaceRegistry::global();
        assert!(registry.implements(CONTENT, "/cosmos.gov.v1beta1.TextProposal"));
        assert!(registry.implements(MSG, "/cosmos.staking.v1beta1.MsgDelegate"));
        assert!(registry.implements(MSG, "/cosmos.group.v1beta1.MsgVote"));
        assert!(registry.implements(MSG, "/cosmos.gov.v1beta1.MsgVote"));
        assert_eq!(registry.implementations(DECISION_POLICY).unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_interface() {
        assert!(InterfaceRegistry::global()
            .implementations("cosmos.staking.v1beta1.Nope")
            .is_none());
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = InterfaceRegistry::new();
        registry.register::<bank::MsgSend>(MSG);
        registry.register::<bank::MsgSend>(MSG);
        assert_eq!(registry.implementations(MSG).unwrap().len(), 1);
    }

    #[test]
    fn test_declared_interface_starts_empty() {
        let mut registry = InterfaceRegistry::new();
        registry.register_interface("example.v1.Thing");
        assert_eq!(registry.implementations("example.v1.Thing"), Some(&[][..]));
    }
}
