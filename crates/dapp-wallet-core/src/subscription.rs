use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::ContractDescriptor;
use crate::error::{normalize_rpc, WalletError};
use crate::ports::ProviderPort;
use crate::abi;

/// Installs log filters for one contract's events.
pub struct EventSubscriber<P: ProviderPort + Clone> {
    provider: P,
    contract: ContractDescriptor,
}

impl<P: ProviderPort + Clone> EventSubscriber<P> {
    pub fn new(provider: P, contract: ContractDescriptor) -> Self {
        Self { provider, contract }
    }

    /// Subscribes `listener` to the named event via an installed log
    /// filter scoped to the contract address and the event's topic0.
    /// Logs are delivered raw (as received from the transport) on each
    /// [`LogSubscription::poll`].
    pub fn subscribe(
        &self,
        event_name: &str,
        listener: impl FnMut(Value) + Send + 'static,
    ) -> Result<LogSubscription<P>, WalletError> {
        let topic = abi::event_topic(&self.contract.abi, event_name)
            .map_err(WalletError::Configuration)?;
        let params = json!([{
            "address": self.contract.address,
            "topics": [topic],
            "fromBlock": "latest",
        }]);
        let filter_id = self
            .provider
            .request("eth_newFilter", params)
            .map_err(|e| normalize_rpc(e, WalletError::ReadFailed))?
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| {
                WalletError::ReadFailed("eth_newFilter returned a non-string id".to_owned())
            })?;
        debug!(event = event_name, filter_id, "log filter installed");
        Ok(LogSubscription {
            provider: self.provider.clone(),
            filter_id,
            listener: Box::new(listener),
            active: AtomicBool::new(true),
        })
    }
}

/// One live log subscription. Dropping the handle tears the filter down.
pub struct LogSubscription<P: ProviderPort> {
    provider: P,
    filter_id: String,
    listener: Box<dyn FnMut(Value) + Send>,
    active: AtomicBool,
}

impl<P: ProviderPort> LogSubscription<P> {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }

    /// Drains new logs from the filter and dispatches each to the
    /// listener. Returns the number of logs delivered.
    pub fn poll(&mut self) -> Result<usize, WalletError> {
        if !self.is_active() {
            return Ok(0);
        }
        let changes = self
            .provider
            .request("eth_getFilterChanges", json!([self.filter_id]))
            .map_err(|e| normalize_rpc(e, WalletError::ReadFailed))?;
        let logs = match changes {
            Value::Array(logs) => logs,
            Value::Null => Vec::new(),
            other => {
                return Err(WalletError::ReadFailed(format!(
                    "eth_getFilterChanges returned unexpected shape: {other}"
                )))
            }
        };
        let delivered = logs.len();
        for log in logs {
            (self.listener)(log);
        }
        Ok(delivered)
    }

    /// Uninstalls the filter. Idempotent; removal failures are logged,
    /// never surfaced, because teardown must not block caller cleanup.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self
            .provider
            .request("eth_uninstallFilter", json!([self.filter_id]))
        {
            warn!(filter_id = %self.filter_id, error = %e, "filter uninstall failed during teardown");
        }
    }
}

impl<P: ProviderPort> Drop for LogSubscription<P> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
