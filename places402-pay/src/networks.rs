//! Known EVM networks for x402 "exact" payments.
//!
//! Maps V1 human-readable network names (e.g. `"base"`) and CAIP-2 identifiers
//! (e.g. `"eip155:8453"`) to numeric EIP-155 chain IDs.

/// Base Mainnet chain ID.
pub const BASE_MAINNET: u64 = 8453;

/// Base Sepolia (testnet) chain ID.
pub const BASE_SEPOLIA: u64 = 84532;

/// Polygon Mainnet chain ID.
pub const POLYGON_MAINNET: u64 = 137;

/// Polygon Amoy (testnet) chain ID.
pub const POLYGON_AMOY: u64 = 80002;

/// Avalanche C-Chain chain ID.
pub const AVALANCHE_MAINNET: u64 = 43114;

/// Avalanche Fuji (testnet) chain ID.
pub const AVALANCHE_FUJI: u64 = 43113;

/// Default EIP-712 domain name for USDC.
pub const DEFAULT_USDC_NAME: &str = "USD Coin";

/// Default EIP-712 domain version for USDC.
pub const DEFAULT_USDC_VERSION: &str = "2";

/// A known network definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// V1 network name.
    pub name: &'static str,
    /// EIP-155 chain ID.
    pub chain_id: u64,
}

/// All EVM networks the interceptor is willing to pay on.
pub const EVM_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "base",
        chain_id: BASE_MAINNET,
    },
    NetworkInfo {
        name: "base-sepolia",
        chain_id: BASE_SEPOLIA,
    },
    NetworkInfo {
        name: "polygon",
        chain_id: POLYGON_MAINNET,
    },
    NetworkInfo {
        name: "polygon-amoy",
        chain_id: POLYGON_AMOY,
    },
    NetworkInfo {
        name: "avalanche",
        chain_id: AVALANCHE_MAINNET,
    },
    NetworkInfo {
        name: "avalanche-fuji",
        chain_id: AVALANCHE_FUJI,
    },
];

/// Resolves a network identifier to an EIP-155 chain ID.
///
/// Accepts V1 names from [`EVM_NETWORKS`] and CAIP-2 `eip155:<id>` strings.
/// Returns `None` for non-EVM or unknown networks.
#[must_use]
pub fn chain_id_for(network: &str) -> Option<u64> {
    if let Some(reference) = network.strip_prefix("eip155:") {
        return reference.parse().ok();
    }
    EVM_NETWORKS
        .iter()
        .find(|n| n.name == network)
        .map(|n| n.chain_id)
}
