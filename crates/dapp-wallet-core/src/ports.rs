use alloy::primitives::Address;
use serde_json::Value;
use thiserror::Error;

/// Raw failure from a provider transport, before classification.
/// JSON-RPC providers report numeric codes (`4902`, `-32002`);
/// ethers-style wrappers report string labels (`"CALL_EXCEPTION"`).
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RpcError {
    pub code: Option<Value>,
    pub message: String,
}

impl RpcError {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn numeric(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(Value::from(code)),
            message: message.into(),
        }
    }

    pub fn labeled(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: Some(Value::from(code)),
            message: message.into(),
        }
    }

    /// EIP-1193 "disconnected" shape, used when no provider transport
    /// can serve requests at all.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::numeric(4900, message)
    }

    pub fn code_number(&self) -> Option<i64> {
        self.code.as_ref().and_then(Value::as_i64)
    }

    pub fn code_label(&self) -> Option<&str> {
        self.code.as_ref().and_then(Value::as_str)
    }
}

/// Provider push notification, drained by the state tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

/// Uniform boundary to the injected wallet object (EIP-1193 shaped).
///
/// Implementations delegate to the host-injected provider and perform no
/// caching or retries of their own.
pub trait ProviderPort {
    /// One request/response pair over the provider channel.
    fn request(&self, method: &str, params: Value) -> Result<Value, RpcError>;

    /// Pending push events, oldest first. Transports without event
    /// support return an empty list.
    fn drain_events(&self) -> Vec<ProviderEvent> {
        Vec::new()
    }
}

impl<P: ProviderPort + ?Sized> ProviderPort for &P {
    fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        (**self).request(method, params)
    }

    fn drain_events(&self) -> Vec<ProviderEvent> {
        (**self).drain_events()
    }
}
