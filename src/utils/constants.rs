//! Constants Module - Single Source of Truth
//!
//! Chain registry, upstream endpoints and the queue/validation numbers
//! used across the proxy and the loader client.

use crate::models::types::Chain;

// ============================================
// APPLICATION CONSTANTS
// ============================================

/// Application name
pub const APP_NAME: &str = "solbridge";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent for outbound HTTP requests
pub const USER_AGENT: &str = "solbridge/0.1.0";

// ============================================
// CHAIN INDICES (OKX chain registry)
// ============================================

/// Solana
pub const SOLANA_CHAIN_INDEX: &str = "501";
/// Ethereum Mainnet
pub const ETHEREUM_CHAIN_INDEX: &str = "1";
/// BNB Smart Chain
pub const BSC_CHAIN_INDEX: &str = "56";
/// Polygon
pub const POLYGON_CHAIN_INDEX: &str = "137";
/// Arbitrum One
pub const ARBITRUM_CHAIN_INDEX: &str = "42161";
/// Optimism
pub const OPTIMISM_CHAIN_INDEX: &str = "10";
/// Avalanche C-Chain
pub const AVALANCHE_CHAIN_INDEX: &str = "43114";
/// Base
pub const BASE_CHAIN_INDEX: &str = "8453";

/// Static chain list offered for selection (name, index, display color)
pub const SUPPORTED_CHAINS: [(&str, &str, &str); 8] = [
    ("Solana", SOLANA_CHAIN_INDEX, "#9945FF"),
    ("Ethereum", ETHEREUM_CHAIN_INDEX, "#627EEA"),
    ("BNB Chain", BSC_CHAIN_INDEX, "#F3BA2F"),
    ("Polygon", POLYGON_CHAIN_INDEX, "#8247E5"),
    ("Arbitrum", ARBITRUM_CHAIN_INDEX, "#28A0F0"),
    ("Optimism", OPTIMISM_CHAIN_INDEX, "#FF0420"),
    ("Avalanche", AVALANCHE_CHAIN_INDEX, "#E84142"),
    ("Base", BASE_CHAIN_INDEX, "#0052FF"),
];

/// All selectable chains as owned values
pub fn supported_chains() -> Vec<Chain> {
    SUPPORTED_CHAINS
        .iter()
        .map(|(name, index, color)| Chain::new(name, index, color))
        .collect()
}

/// Look up a chain by its index
pub fn chain_by_index(index: &str) -> Option<Chain> {
    SUPPORTED_CHAINS
        .iter()
        .find(|(_, i, _)| *i == index)
        .map(|(name, index, color)| Chain::new(name, index, color))
}

/// Human-readable chain name, falling back to the raw index
pub fn chain_name(index: &str) -> String {
    chain_by_index(index)
        .map(|c| c.name)
        .unwrap_or_else(|| format!("Chain {}", index))
}

// ============================================
// UPSTREAM ENDPOINTS
// ============================================

/// OKX Web3 API origin
pub const OKX_BASE_URL: &str = "https://web3.okx.com";

/// Jupiter v6 quote endpoint
pub const JUPITER_QUOTE_URL: &str = "https://quote-api.jup.ag/v6/quote";

/// Jupiter strict token list
pub const JUPITER_TOKENS_URL: &str = "https://token.jup.ag/strict";

/// Public Solana mainnet RPC
pub const SOLANA_PUBLIC_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default proxy origin used by the loader client
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080";

// ============================================
// QUEUE / RETRY CONSTANTS
// ============================================

/// Minimum spacing between two queued requests
pub const MIN_REQUEST_DELAY_MS: u64 = 5000;

/// Retry budget per queued request
pub const MAX_RETRIES: u32 = 3;

/// Cap for exponential 429 backoff
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Linear backoff step for non-429 failures (step * retries)
pub const LINEAR_BACKOFF_STEP_MS: u64 = 3000;

/// Base delay handed to `enqueue` by the loader
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 2000;

/// Debounce window for token reloads after a chain change
pub const TOKEN_RELOAD_DEBOUNCE_MS: u64 = 500;

// ============================================
// VALIDATION CONSTANTS
// ============================================

/// Lowest accepted slippage (0.2%)
pub const MIN_SLIPPAGE: f64 = 0.002;

/// Highest accepted slippage (50%)
pub const MAX_SLIPPAGE: f64 = 0.5;

/// Preferred default source token
pub const DEFAULT_FROM_SYMBOL: &str = "SOL";

/// Preferred default destination token
pub const DEFAULT_TO_SYMBOL: &str = "USDC";

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
