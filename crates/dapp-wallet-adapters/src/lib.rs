pub mod config;
pub mod eip1193;
pub mod rpc;

pub use config::WalletAdapterConfig;
pub use eip1193::Eip1193Adapter;
pub use rpc::{post_json_rpc, select_event_transport, EventTransport, HttpRpcAdapter};
