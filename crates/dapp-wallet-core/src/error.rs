use thiserror::Error;

use crate::domain::ChainIssue;
use crate::ports::RpcError;

/// Closed error taxonomy surfaced to the host. Raw provider failures are
/// always normalized into one of these kinds with the original message
/// preserved as context.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
    #[error("no EIP-1193 provider available: {0}")]
    ProviderUnavailable(String),
    #[error("wallet connect failed: {0}")]
    ConnectFailed(String),
    /// Non-fatal: local wallet state is already cleared when this is
    /// reported.
    #[error("wallet disconnect incomplete: {0}")]
    DisconnectFailed(String),
    #[error("chain switch failed: {0}")]
    SwitchChainFailed(String),
    #[error("chain {chain_id} is not in the supported-chains set; refusing to guess chain metadata")]
    ChainNotConfigured { chain_id: u64 },
    #[error("adding chain to wallet failed: {0}")]
    AddChainFailed(String),
    #[error("wrong network: connected to {current:?}, expected {expected} ({issue})")]
    WrongNetwork {
        expected: u64,
        current: Option<u64>,
        issue: ChainIssue,
    },
    #[error("network switch before write failed: {0}")]
    NetworkSwitchFailed(String),
    #[error("contract read failed: {0}")]
    ReadFailed(String),
    #[error("contract write failed: {0}")]
    WriteFailed(String),
    #[error(
        "transaction reverted or contract not deployed on this network; \
         switch to the default chain and retry"
    )]
    ContractRevertedOrNotDeployed,
    #[error("RPC endpoint rate limited; use a different RPC endpoint")]
    RateLimited,
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Request-already-pending / rate-limit shape (`-32002`, or MetaMask's
/// "too many requests" message).
pub fn is_rate_limited(raw: &RpcError) -> bool {
    raw.code_number() == Some(-32002) || raw.message.contains("too many")
}

/// EIP-1193 code 4900: the provider is disconnected from all chains.
pub fn is_provider_unavailable(raw: &RpcError) -> bool {
    raw.code_number() == Some(4900)
}

/// The "missing revert data" CALL_EXCEPTION pattern: either the contract
/// reverted without a reason string or there is no contract at the target
/// address on the active chain. Code 3 is the standard JSON-RPC execution
/// revert.
pub fn is_reverted_or_undeployed(raw: &RpcError) -> bool {
    if raw.code_number() == Some(3) {
        return true;
    }
    if raw.message.contains("missing revert data") {
        return true;
    }
    raw.code_label() == Some("CALL_EXCEPTION") && raw.message.contains("revert")
}

/// Maps a raw provider failure onto the taxonomy: cross-cutting kinds
/// first, then the call-site wrapper with the message preserved.
pub fn normalize_rpc(raw: RpcError, wrap: impl FnOnce(String) -> WalletError) -> WalletError {
    if is_rate_limited(&raw) {
        WalletError::RateLimited
    } else if is_provider_unavailable(&raw) {
        WalletError::ProviderUnavailable(raw.message)
    } else {
        wrap(raw.message)
    }
}

/// Like [`normalize_rpc`] but additionally rewrites the revert /
/// not-deployed pattern, used on the contract invocation paths.
pub fn normalize_invocation(raw: RpcError, wrap: impl FnOnce(String) -> WalletError) -> WalletError {
    if is_reverted_or_undeployed(&raw) {
        WalletError::ContractRevertedOrNotDeployed
    } else {
        normalize_rpc(raw, wrap)
    }
}
