use std::time::{Duration, Instant};

use alloy::dyn_abi::DynSolValue;
use alloy::json_abi::StateMutability;
use alloy::primitives::{Address, B256};
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::{ChainIssue, ChainValidation, ContractDescriptor};
use crate::error::{normalize_invocation, normalize_rpc, WalletError};
use crate::negotiation::ChainNegotiator;
use crate::ports::ProviderPort;
use crate::abi;

/// Progress callbacks for a write call. All methods default to no-ops so
/// hosts implement only what they render.
pub trait WriteObserver {
    fn on_switching(&mut self, _message: &str) {}
    fn on_switched(&mut self, _message: &str) {}
    fn on_submitted(&mut self, _tx_hash: B256) {}
    fn on_confirmed(&mut self, _receipt: &TransactionReceipt) {}
}

/// Observer for callers that do not track write progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl WriteObserver for NoopObserver {}

/// Confirmed transaction receipt: typed essentials plus the raw JSON for
/// hosts that need the full object.
#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub status: Option<bool>,
    pub raw: Value,
}

/// Result of a write call: a confirmed receipt for state-mutating
/// functions, or the decoded values of a view-like call routed through
/// the write path.
#[derive(Debug)]
pub enum WriteOutcome {
    Receipt(TransactionReceipt),
    Value(Vec<DynSolValue>),
}

#[derive(Debug, Clone)]
pub struct InvocationConfig {
    pub receipt_poll_interval: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            receipt_poll_interval: Duration::from_secs(2),
            confirmation_timeout: Duration::from_secs(180),
        }
    }
}

/// Preflight-validate -> invoke -> confirm pipeline for one contract.
pub struct ContractClient<P: ProviderPort + Clone> {
    provider: P,
    contract: ContractDescriptor,
    negotiator: ChainNegotiator<P>,
    config: InvocationConfig,
}

impl<P: ProviderPort + Clone> ContractClient<P> {
    pub fn new(provider: P, contract: ContractDescriptor) -> Self {
        let negotiator = ChainNegotiator::new(provider.clone(), contract.chains.clone());
        Self {
            provider,
            contract,
            negotiator,
            config: InvocationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InvocationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn contract(&self) -> &ContractDescriptor {
        &self.contract
    }

    /// Fresh preflight validation of the wallet's active chain.
    pub fn validate(&self) -> ChainValidation {
        self.negotiator.validate_active_chain(&self.contract)
    }

    /// Read-only invocation. Reads never auto-correct the network; a
    /// failed preflight surfaces as `WrongNetwork`.
    pub fn read(&self, method: &str, args: &[Value]) -> Result<Vec<DynSolValue>, WalletError> {
        let validation = self.validate();
        if !validation.ok {
            return Err(wrong_network(&validation));
        }

        let function =
            abi::resolve_function(&self.contract.abi, method).map_err(WalletError::ReadFailed)?;
        let calldata = abi::encode_call(function, args).map_err(WalletError::ReadFailed)?;
        let result = self
            .provider
            .request("eth_call", call_params(self.contract.address, &calldata))
            .map_err(|e| normalize_invocation(e, WalletError::ReadFailed))?;
        let output = hex_bytes(&result)
            .ok_or_else(|| WalletError::ReadFailed("eth_call returned a non-hex result".to_owned()))?;
        abi::decode_output(function, &output).map_err(WalletError::ReadFailed)
    }

    /// Write invocation with submission/confirmation tracking.
    ///
    /// A failed preflight triggers one switch negotiation (observer
    /// notified before and after); view-like functions routed through
    /// here return their value directly with no submission callbacks.
    pub fn write(
        &self,
        method: &str,
        args: &[Value],
        observer: &mut dyn WriteObserver,
    ) -> Result<WriteOutcome, WalletError> {
        let validation = self.validate();
        if !validation.ok {
            observer.on_switching("wrong network detected; switching to the default chain");
            self.negotiator
                .switch_chain(self.contract.default_chain.id)
                .map_err(|e| WalletError::NetworkSwitchFailed(e.to_string()))?;
            observer.on_switched("switched to the default chain");
        }

        let function =
            abi::resolve_function(&self.contract.abi, method).map_err(WalletError::WriteFailed)?;
        let calldata = abi::encode_call(function, args).map_err(WalletError::WriteFailed)?;

        if matches!(
            function.state_mutability,
            StateMutability::View | StateMutability::Pure
        ) {
            let result = self
                .provider
                .request("eth_call", call_params(self.contract.address, &calldata))
                .map_err(|e| normalize_invocation(e, WalletError::WriteFailed))?;
            let output = hex_bytes(&result).ok_or_else(|| {
                WalletError::WriteFailed("eth_call returned a non-hex result".to_owned())
            })?;
            let values = abi::decode_output(function, &output).map_err(WalletError::WriteFailed)?;
            return Ok(WriteOutcome::Value(values));
        }

        let from = self.signer_account()?;
        let tx = json!([{
            "from": from,
            "to": self.contract.address,
            "data": format!("0x{}", alloy::hex::encode(&calldata)),
        }]);
        let result = self
            .provider
            .request("eth_sendTransaction", tx)
            .map_err(|e| normalize_invocation(e, WalletError::WriteFailed))?;
        let tx_hash: B256 = result
            .as_str()
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| {
                WalletError::WriteFailed("eth_sendTransaction returned an invalid hash".to_owned())
            })?;
        debug!(%tx_hash, method, "transaction submitted");
        observer.on_submitted(tx_hash);

        let receipt = self.wait_for_receipt(tx_hash)?;
        observer.on_confirmed(&receipt);
        Ok(WriteOutcome::Receipt(receipt))
    }

    /// First wallet account, used as the transaction sender.
    fn signer_account(&self) -> Result<Address, WalletError> {
        let result = self
            .provider
            .request("eth_accounts", json!([]))
            .map_err(|e| normalize_rpc(e, WalletError::WriteFailed))?;
        result
            .as_array()
            .and_then(|accounts| accounts.first())
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| {
                WalletError::WriteFailed(
                    "no wallet account available to submit the transaction".to_owned(),
                )
            })
    }

    fn wait_for_receipt(&self, tx_hash: B256) -> Result<TransactionReceipt, WalletError> {
        let deadline = Instant::now() + self.config.confirmation_timeout;
        loop {
            let result = self
                .provider
                .request("eth_getTransactionReceipt", json!([tx_hash]))
                .map_err(|e| normalize_invocation(e, WalletError::WriteFailed))?;
            if !result.is_null() {
                return receipt_from_value(result).map_err(WalletError::WriteFailed);
            }
            if Instant::now() >= deadline {
                return Err(WalletError::WriteFailed(format!(
                    "timed out waiting for confirmation of {tx_hash}"
                )));
            }
            std::thread::sleep(self.config.receipt_poll_interval);
        }
    }
}

fn wrong_network(validation: &ChainValidation) -> WalletError {
    WalletError::WrongNetwork {
        expected: validation.expected_chain_id,
        current: validation.current_chain_id,
        issue: validation.issue.unwrap_or(ChainIssue::Unreadable),
    }
}

fn call_params(to: Address, calldata: &[u8]) -> Value {
    json!([{
        "to": to,
        "data": format!("0x{}", alloy::hex::encode(calldata)),
    }, "latest"])
}

fn hex_bytes(value: &Value) -> Option<Vec<u8>> {
    alloy::hex::decode(value.as_str()?).ok()
}

fn receipt_from_value(raw: Value) -> Result<TransactionReceipt, String> {
    let transaction_hash = raw
        .get("transactionHash")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| "receipt is missing a valid transactionHash".to_owned())?;
    let block_number = raw.get("blockNumber").and_then(quantity_from_value);
    let status = raw.get("status").and_then(quantity_from_value).map(|s| s == 1);
    Ok(TransactionReceipt {
        transaction_hash,
        block_number,
        status,
        raw,
    })
}

fn quantity_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => u64::from_str_radix(s.trim_start_matches("0x"), 16).ok(),
        _ => None,
    }
}
