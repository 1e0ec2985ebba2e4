/// Runtime configuration for the provider transports.
#[derive(Debug, Clone)]
pub struct WalletAdapterConfig {
    /// JSON-RPC bridge to a wallet-owning endpoint. When unset, the
    /// adapter falls back to the deterministic in-memory wallet unless
    /// the runtime profile is strict.
    pub eip1193_proxy_url: Option<String>,
    pub request_timeout_ms: u64,
    pub runtime_profile: String,
}

impl Default for WalletAdapterConfig {
    fn default() -> Self {
        Self {
            eip1193_proxy_url: None,
            request_timeout_ms: 15_000,
            runtime_profile: "development".to_owned(),
        }
    }
}

impl WalletAdapterConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("DAPP_WALLET_EIP1193_PROXY_URL") {
            if !url.is_empty() {
                config.eip1193_proxy_url = Some(url);
            }
        }
        if let Ok(raw) = std::env::var("DAPP_WALLET_REQUEST_TIMEOUT_MS") {
            if let Ok(timeout) = raw.parse() {
                config.request_timeout_ms = timeout;
            }
        }
        if let Ok(profile) = std::env::var("DAPP_WALLET_RUNTIME_PROFILE") {
            if !profile.is_empty() {
                config.runtime_profile = profile;
            }
        }
        config
    }

    /// In the production profile a missing transport disables the
    /// adapter instead of silently running against the deterministic
    /// wallet.
    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == "production"
    }
}
