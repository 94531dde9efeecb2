//! Domain types shared by the proxy and the loader client
//!
//! Wire names are camelCase to match the proxy's JSON contract.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::errors::AppError;
use crate::utils::constants::SOLANA_CHAIN_INDEX;

/// A selectable blockchain network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub name: String,
    /// OKX chain index ("501" = Solana)
    pub index: String,
    /// Display color
    pub color: String,
}

impl Chain {
    pub fn new(name: &str, index: &str, color: &str) -> Self {
        Self {
            name: name.to_string(),
            index: index.to_string(),
            color: color.to_string(),
        }
    }

    pub fn is_solana(&self) -> bool {
        self.index == SOLANA_CHAIN_INDEX
    }
}

/// A token on one chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    pub address: String,
    #[serde(default, deserialize_with = "de::u8_lenient")]
    pub decimals: u8,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub chain_index: String,
}

/// A supported (source token, destination token) combination across two chains
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    #[serde(deserialize_with = "de::string_or_number")]
    pub from_chain_index: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub to_chain_index: String,
    #[serde(default)]
    pub from_token_address: String,
    #[serde(default)]
    pub to_token_address: String,
    pub from_token_symbol: String,
    pub to_token_symbol: String,
    #[serde(default)]
    pub pair_id: String,
}

impl TokenPair {
    /// Stable identifier for a pair: `from:symbol->to:symbol`
    pub fn make_id(
        from_chain_index: &str,
        from_symbol: &str,
        to_chain_index: &str,
        to_symbol: &str,
    ) -> String {
        format!(
            "{}:{}->{}:{}",
            from_chain_index, from_symbol, to_chain_index, to_symbol
        )
    }

    /// Whether this pair connects the given chain route
    pub fn on_route(&self, from_chain_index: &str, to_chain_index: &str) -> bool {
        self.from_chain_index == from_chain_index && self.to_chain_index == to_chain_index
    }
}

/// A cross-chain bridge provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bridge {
    #[serde(deserialize_with = "de::string_or_number")]
    pub bridge_id: String,
    pub bridge_name: String,
    #[serde(default)]
    pub require_other_native_fee: bool,
    #[serde(default, deserialize_with = "de::string_list")]
    pub supported_chains: Vec<String>,
    #[serde(default)]
    pub supports_solana: bool,
}

impl Bridge {
    /// Whether this bridge serves both ends of a route
    pub fn connects(&self, from_chain_index: &str, to_chain_index: &str) -> bool {
        self.supported_chains.iter().any(|c| c == from_chain_index)
            && self.supported_chains.iter().any(|c| c == to_chain_index)
    }
}

/// Which token list to fetch for a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TokenListKind {
    /// Every token the aggregator knows on the chain
    #[default]
    ChainTokens,
    /// Only tokens usable in cross-chain routes
    CrossChainSupported,
}

impl TokenListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChainTokens => "chain-tokens",
            Self::CrossChainSupported => "cross-chain-supported",
        }
    }
}

impl fmt::Display for TokenListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenListKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chain-tokens" => Ok(Self::ChainTokens),
            "cross-chain-supported" => Ok(Self::CrossChainSupported),
            other => Err(AppError::validation(format!(
                "Invalid token list type: {}. Expected chain-tokens or cross-chain-supported",
                other
            ))),
        }
    }
}

/// Outcome of route validation for the current selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairValidationResult {
    pub is_valid: bool,
    pub message: String,
    pub available_bridges: Vec<Bridge>,
}

impl PairValidationResult {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            available_bridges: Vec::new(),
        }
    }
}

// ============================================
// Swap result (build-tx output)
// ============================================

/// Bridge routing information of a built transaction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterInfo {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub bridge_id: Option<String>,
    #[serde(default)]
    pub bridge_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub other_native_fee: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub cross_chain_fee: Option<String>,
    #[serde(default)]
    pub cross_chain_fee_token_address: Option<String>,
}

/// Ready-to-sign transaction payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxPayload {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub value: String,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub gas_limit: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub gas_price: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub max_priority_fee_per_gas: Option<String>,
}

/// One entry of a build-tx response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResult {
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub from_token_amount: String,
    #[serde(default, deserialize_with = "de::string_or_number")]
    pub to_token_amount: String,
    /// Upstream spells it this way
    #[serde(default, rename = "minmumReceive", deserialize_with = "de::string_or_number")]
    pub minimum_receive: String,
    #[serde(default)]
    pub router: RouterInfo,
    #[serde(default)]
    pub tx: TxPayload,
}

// ============================================
// Proxy envelopes
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgesEnvelope {
    pub success: bool,
    #[serde(default)]
    pub bridges: Vec<Bridge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PairsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub pairs: Vec<TokenPair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokensEnvelope {
    pub success: bool,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<SwapResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// Lenient deserializers: upstream mixes numbers and numeric strings
pub mod de {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Str(String),
        Num(serde_json::Number),
        Bool(bool),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Scalar::Str(s) => s,
                Scalar::Num(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Scalar>::deserialize(deserializer)?
            .map(Scalar::into_string)
            .unwrap_or_default())
    }

    pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Scalar>::deserialize(deserializer)?
            .map(Scalar::into_string)
            .filter(|s| !s.is_empty()))
    }

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Vec<Scalar>>::deserialize(deserializer)?
            .unwrap_or_default()
            .into_iter()
            .map(Scalar::into_string)
            .collect())
    }

    pub fn u8_lenient<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = string_or_number(deserializer)?;
        if raw.is_empty() {
            return Ok(0);
        }
        raw.parse::<u8>().map_err(serde::de::Error::custom)
    }
}
