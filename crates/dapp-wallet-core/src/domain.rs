use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WalletError;

/// Connection lifecycle of the tracked wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    Idle,
    Connecting,
    Connected,
    Disconnected,
    Error,
}

/// Snapshot of the wallet as seen by the state tracker.
///
/// `address` is always the first entry of `accounts`; `status` is
/// `Connected` exactly when `accounts` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: Option<Address>,
    pub accounts: Vec<Address>,
    pub chain_id: Option<u64>,
    pub status: WalletStatus,
}

impl Default for WalletAccount {
    fn default() -> Self {
        Self {
            address: None,
            accounts: Vec::new(),
            chain_id: None,
            status: WalletStatus::Idle,
        }
    }
}

impl WalletAccount {
    pub fn is_connected(&self) -> bool {
        self.status == WalletStatus::Connected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Host-supplied description of one supported chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub id: u64,
    pub name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub block_explorer_url: Option<String>,
}

impl ChainDescriptor {
    /// Parameter object for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> Value {
        serde_json::json!({
            "chainId": hex_chain_id(self.id),
            "chainName": self.name,
            "rpcUrls": self.rpc_urls,
            "nativeCurrency": self.native_currency,
            "blockExplorerUrls": self
                .block_explorer_url
                .as_deref()
                .map(|url| vec![url])
                .unwrap_or_default(),
        })
    }
}

/// Validated, non-empty set of supported chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRegistry(Vec<ChainDescriptor>);

impl ChainRegistry {
    pub fn new(chains: Vec<ChainDescriptor>) -> Result<Self, WalletError> {
        if chains.is_empty() {
            return Err(WalletError::Configuration(
                "at least one supported chain is required; an empty set is not allowed".to_owned(),
            ));
        }
        Ok(Self(chains))
    }

    pub fn by_id(&self, chain_id: u64) -> Option<&ChainDescriptor> {
        self.0.iter().find(|chain| chain.id == chain_id)
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.by_id(chain_id).is_some()
    }

    pub fn chains(&self) -> &[ChainDescriptor] {
        &self.0
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|chain| chain.name.as_str()).collect()
    }
}

/// Why the active chain failed validation. `Display` renders the
/// user-facing reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainIssue {
    Unreadable,
    Unsupported,
    Mismatch,
}

impl std::fmt::Display for ChainIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            ChainIssue::Unreadable => "cannot determine network",
            ChainIssue::Unsupported => "unsupported network",
            ChainIssue::Mismatch => "network mismatch",
        };
        f.write_str(reason)
    }
}

/// Result of one preflight chain validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainValidation {
    pub ok: bool,
    pub expected_chain_id: u64,
    pub current_chain_id: Option<u64>,
    pub issue: Option<ChainIssue>,
}

impl ChainValidation {
    pub fn valid(expected_chain_id: u64) -> Self {
        Self {
            ok: true,
            expected_chain_id,
            current_chain_id: Some(expected_chain_id),
            issue: None,
        }
    }

    pub fn invalid(expected_chain_id: u64, current_chain_id: Option<u64>, issue: ChainIssue) -> Self {
        Self {
            ok: false,
            expected_chain_id,
            current_chain_id,
            issue: Some(issue),
        }
    }
}

/// Host-supplied contract binding input.
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    pub address: Address,
    pub abi: JsonAbi,
    pub default_chain: ChainDescriptor,
    pub chains: ChainRegistry,
    pub rpc_url: Option<String>,
}

impl ContractDescriptor {
    pub fn from_abi_json(
        address: Address,
        abi_json: &str,
        default_chain: ChainDescriptor,
        chains: ChainRegistry,
        rpc_url: Option<String>,
    ) -> Result<Self, WalletError> {
        let abi: JsonAbi = serde_json::from_str(abi_json)
            .map_err(|e| WalletError::Configuration(format!("invalid contract abi json: {e}")))?;
        if !chains.contains(default_chain.id) {
            return Err(WalletError::Configuration(format!(
                "default chain {} is not part of the supported-chains set",
                default_chain.id
            )));
        }
        Ok(Self {
            address,
            abi,
            default_chain,
            chains,
            rpc_url,
        })
    }
}

/// Renders a chain id in the hex form wallet RPC methods expect.
pub fn hex_chain_id(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}

/// Parses a chain id from its hex (`"0x2105"`) or decimal (`"8453"`)
/// string form.
pub fn parse_chain_id(raw: &str) -> Option<u64> {
    if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        raw.parse().ok()
    }
}

/// Normalizes a provider-supplied chain id, which may arrive as a JSON
/// number or a hex/decimal string.
pub fn chain_id_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_chain_id(s),
        _ => None,
    }
}
