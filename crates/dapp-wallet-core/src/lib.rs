pub mod abi;
pub mod domain;
pub mod error;
pub mod negotiation;
pub mod pipeline;
pub mod ports;
pub mod subscription;
pub mod tracker;

pub use domain::{
    chain_id_from_value, hex_chain_id, parse_chain_id, ChainDescriptor, ChainIssue, ChainRegistry,
    ChainValidation, ContractDescriptor, NativeCurrency, WalletAccount, WalletStatus,
};
pub use error::{
    is_provider_unavailable, is_rate_limited, is_reverted_or_undeployed, normalize_invocation,
    normalize_rpc, WalletError,
};
pub use negotiation::ChainNegotiator;
pub use pipeline::{
    ContractClient, InvocationConfig, NoopObserver, TransactionReceipt, WriteObserver,
    WriteOutcome,
};
pub use ports::{ProviderEvent, ProviderPort, RpcError};
pub use subscription::{EventSubscriber, LogSubscription};
pub use tracker::WalletTracker;
