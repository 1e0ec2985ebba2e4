use alloy::primitives::Address;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{chain_id_from_value, ChainRegistry, WalletAccount, WalletStatus};
use crate::error::{normalize_rpc, WalletError};
use crate::ports::{ProviderEvent, ProviderPort, RpcError};

/// Tracks the wallet's account, chain, and connection status.
///
/// The tracker exclusively owns the [`WalletAccount`]; it changes only in
/// response to explicit connect/disconnect calls or provider push events.
pub struct WalletTracker<P: ProviderPort> {
    provider: P,
    chains: ChainRegistry,
    account: WalletAccount,
}

impl<P: ProviderPort> WalletTracker<P> {
    pub fn new(provider: P, chains: ChainRegistry) -> Self {
        Self {
            provider,
            chains,
            account: WalletAccount::default(),
        }
    }

    pub fn account(&self) -> &WalletAccount {
        &self.account
    }

    pub fn status(&self) -> WalletStatus {
        self.account.status
    }

    /// Whether the active chain is in the supported set; `None` while the
    /// chain id is unknown.
    pub fn is_supported_chain(&self) -> Option<bool> {
        self.account.chain_id.map(|id| self.chains.contains(id))
    }

    /// Initial sync: `eth_accounts`, then `eth_chainId`. Failures move
    /// the status to `Error` without surfacing to the caller.
    pub fn sync(&mut self) {
        self.account.status = WalletStatus::Connecting;
        let accounts = match self.fetch_accounts("eth_accounts") {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(error = %e, "initial account sync failed");
                self.account.status = WalletStatus::Error;
                return;
            }
        };
        self.replace_accounts(accounts);
        match self.fetch_chain_id() {
            Ok(chain_id) => self.account.chain_id = chain_id,
            Err(e) => {
                warn!(error = %e, "initial chain sync failed");
                self.account.status = WalletStatus::Error;
            }
        }
    }

    /// Interactive connect: prompts the wallet via `eth_requestAccounts`,
    /// then reads the chain id.
    pub fn connect(&mut self) -> Result<&WalletAccount, WalletError> {
        self.account.status = WalletStatus::Connecting;
        let accounts = match self.fetch_accounts("eth_requestAccounts") {
            Ok(accounts) => accounts,
            Err(e) => {
                self.account.status = WalletStatus::Error;
                return Err(normalize_rpc(e, WalletError::ConnectFailed));
            }
        };
        let chain_id = match self.fetch_chain_id() {
            Ok(chain_id) => chain_id,
            Err(e) => {
                self.account.status = WalletStatus::Error;
                return Err(normalize_rpc(e, WalletError::ConnectFailed));
            }
        };
        self.replace_accounts(accounts);
        self.account.chain_id = chain_id;
        Ok(&self.account)
    }

    /// Best-effort permission revoke, then an unconditional local reset.
    /// Wallets without revocation support are tolerated; any other revoke
    /// failure is the non-fatal [`WalletError::DisconnectFailed`].
    pub fn disconnect(&mut self) -> Result<(), WalletError> {
        let revoke = self.provider.request(
            "wallet_revokePermissions",
            serde_json::json!([{ "eth_accounts": {} }]),
        );
        self.account = WalletAccount {
            status: WalletStatus::Disconnected,
            ..WalletAccount::default()
        };
        match revoke {
            Ok(_) => Ok(()),
            Err(e) if revocation_unsupported(&e) => {
                debug!(error = %e, "wallet does not support permission revocation");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "permission revoke failed; local state cleared anyway");
                Err(WalletError::DisconnectFailed(e.message))
            }
        }
    }

    /// Applies one provider push event, last-write-wins.
    pub fn apply_event(&mut self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.replace_accounts(accounts),
            ProviderEvent::ChainChanged(chain_id) => {
                self.account.chain_id = Some(chain_id);
            }
        }
    }

    /// Drains pending provider events and applies them in order. Returns
    /// the number of events applied.
    pub fn sync_events(&mut self) -> usize {
        let events = self.provider.drain_events();
        let applied = events.len();
        for event in events {
            self.apply_event(event);
        }
        applied
    }

    fn replace_accounts(&mut self, accounts: Vec<Address>) {
        self.account.address = accounts.first().copied();
        self.account.status = if accounts.is_empty() {
            WalletStatus::Disconnected
        } else {
            WalletStatus::Connected
        };
        self.account.accounts = accounts;
    }

    fn fetch_accounts(&self, method: &str) -> Result<Vec<Address>, RpcError> {
        let result = self.provider.request(method, serde_json::json!([]))?;
        accounts_from_value(&result).map_err(RpcError::message_only)
    }

    fn fetch_chain_id(&self) -> Result<Option<u64>, RpcError> {
        let result = self.provider.request("eth_chainId", serde_json::json!([]))?;
        Ok(chain_id_from_value(&result))
    }
}

fn revocation_unsupported(raw: &RpcError) -> bool {
    // -32601: method not found; 4200: EIP-1193 unsupported method.
    matches!(raw.code_number(), Some(-32601) | Some(4200))
}

fn accounts_from_value(value: &Value) -> Result<Vec<Address>, String> {
    let entries = value
        .as_array()
        .ok_or_else(|| "accounts response must be an array".to_owned())?;
    let mut accounts = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw = entry
            .as_str()
            .ok_or_else(|| "account entry must be a string".to_owned())?;
        let parsed: Address = raw
            .parse()
            .map_err(|e| format!("invalid account address '{raw}': {e}"))?;
        accounts.push(parsed);
    }
    Ok(accounts)
}
