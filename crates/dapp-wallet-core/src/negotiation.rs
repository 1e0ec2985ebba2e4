use serde_json::json;
use tracing::debug;

use crate::domain::{
    chain_id_from_value, hex_chain_id, ChainIssue, ChainRegistry, ChainValidation,
    ContractDescriptor,
};
use crate::error::{normalize_rpc, WalletError};
use crate::ports::ProviderPort;

/// Provider error code for "chain unrecognized by the wallet", which
/// triggers the add-chain fallback.
const UNRECOGNIZED_CHAIN: i64 = 4902;

/// Drives the switch-or-add-chain negotiation with the wallet.
pub struct ChainNegotiator<P: ProviderPort> {
    provider: P,
    chains: ChainRegistry,
}

impl<P: ProviderPort> ChainNegotiator<P> {
    pub fn new(provider: P, chains: ChainRegistry) -> Self {
        Self { provider, chains }
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    /// Brings the wallet onto `target_chain_id`.
    ///
    /// On code 4902 the full descriptor is looked up in the supported
    /// set — metadata is never guessed — then `wallet_addEthereumChain`
    /// runs and the switch is retried once. Failures in that fallback
    /// stage surface as [`WalletError::AddChainFailed`]; any other switch
    /// error keeps the provider's message as [`WalletError::SwitchChainFailed`].
    pub fn switch_chain(&self, target_chain_id: u64) -> Result<(), WalletError> {
        let params = json!([{ "chainId": hex_chain_id(target_chain_id) }]);
        debug!(chain_id = target_chain_id, "requesting wallet chain switch");
        match self
            .provider
            .request("wallet_switchEthereumChain", params.clone())
        {
            Ok(_) => Ok(()),
            Err(e) if e.code_number() == Some(UNRECOGNIZED_CHAIN) => {
                let chain = self
                    .chains
                    .by_id(target_chain_id)
                    .ok_or(WalletError::ChainNotConfigured {
                        chain_id: target_chain_id,
                    })?;
                debug!(chain_id = target_chain_id, "chain unknown to wallet; adding");
                self.provider
                    .request("wallet_addEthereumChain", json!([chain.add_chain_params()]))
                    .map_err(|e| normalize_rpc(e, WalletError::AddChainFailed))?;
                self.provider
                    .request("wallet_switchEthereumChain", params)
                    .map_err(|e| normalize_rpc(e, WalletError::AddChainFailed))?;
                Ok(())
            }
            Err(e) => Err(normalize_rpc(e, WalletError::SwitchChainFailed)),
        }
    }

    /// Reads the wallet's active chain id, or `None` when it cannot be
    /// determined.
    pub fn current_chain_id(&self) -> Option<u64> {
        self.provider
            .request("eth_chainId", json!([]))
            .ok()
            .and_then(|value| chain_id_from_value(&value))
    }

    /// Three-tier preflight check: unreadable, unsupported, or supported
    /// but different from the contract's default chain.
    pub fn validate_active_chain(&self, contract: &ContractDescriptor) -> ChainValidation {
        let expected = contract.default_chain.id;
        let current = match self.current_chain_id() {
            Some(chain_id) => chain_id,
            None => return ChainValidation::invalid(expected, None, ChainIssue::Unreadable),
        };
        if !contract.chains.contains(current) {
            return ChainValidation::invalid(expected, Some(current), ChainIssue::Unsupported);
        }
        if current != expected {
            return ChainValidation::invalid(expected, Some(current), ChainIssue::Mismatch);
        }
        ChainValidation::valid(expected)
    }
}
