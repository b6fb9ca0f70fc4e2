//! Cluster inference and RPC endpoint resolution.

use minter_types::env_utils::env_var;
use serde::{Deserialize, Serialize};

const MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";
const TESTNET_RPC: &str = "https://api.testnet.solana.com";
const DEVNET_RPC: &str = "https://api.devnet.solana.com";
const LOCALNET_RPC: &str = "http://127.0.0.1:8899";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Cluster::Devnet => DEVNET_RPC,
            Cluster::Testnet => TESTNET_RPC,
            Cluster::MainnetBeta => MAINNET_RPC,
            Cluster::Localnet => LOCALNET_RPC,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Cluster::Devnet => "devnet",
            Cluster::Testnet => "testnet",
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Localnet => "localnet",
        }
    }
}

impl std::fmt::Display for Cluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn infer_cluster_from_url(url: &str) -> Option<Cluster> {
    let lower = url.to_lowercase();
    if lower.contains("devnet") {
        Some(Cluster::Devnet)
    } else if lower.contains("testnet") {
        Some(Cluster::Testnet)
    } else if lower.contains("mainnet") {
        Some(Cluster::MainnetBeta)
    } else if lower.contains("localhost") || lower.contains("127.0.0.1") {
        Some(Cluster::Localnet)
    } else {
        None
    }
}

/// Join a Helius base URL and API key into `<url>/?api-key=<key>`.
pub fn helius_endpoint(base_url: &str, api_key: &str) -> String {
    format!("{}/?api-key={}", base_url.trim_end_matches('/'), api_key)
}

/// Pick the RPC endpoint for this run.
///
/// Order: `MINTER_RPC_URL`, then `HELIUS_RPC_URL` + `HELIUS_API_KEY`, then the
/// URL from the Solana CLI config, then the devnet cluster URL.
pub fn resolve_rpc_endpoint(config_url: Option<&str>) -> String {
    if let Some(url) = env_var::<String>("MINTER_RPC_URL") {
        return url;
    }
    resolve_rpc_endpoint_from(
        env_var::<String>("HELIUS_RPC_URL").as_deref(),
        env_var::<String>("HELIUS_API_KEY").as_deref(),
        config_url,
    )
}

fn resolve_rpc_endpoint_from(
    helius_url: Option<&str>,
    helius_key: Option<&str>,
    config_url: Option<&str>,
) -> String {
    if let (Some(url), Some(key)) = (helius_url, helius_key) {
        return helius_endpoint(url, key);
    }
    match config_url.map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => url.to_string(),
        None => Cluster::Devnet.default_rpc_url().to_string(),
    }
}
