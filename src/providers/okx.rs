//! OKX DEX API Client
//!
//! Signed GET requests against `web3.okx.com`. Only the request shapes in
//! [`OkxEndpoint`] can be issued.
//!
//! Signing: `base64(HMAC-SHA256(secret, timestamp + "GET" + path?query))`
//! in `OK-ACCESS-SIGN`, see `utils/signing.rs`.
//!
//! Error mapping:
//! - connection failure → `UPSTREAM_UNAVAILABLE` (503)
//! - HTTP 429 → `RATE_LIMIT_EXCEEDED` (429) so callers can back off
//! - other non-2xx, or `code != "0"` in the body → `UPSTREAM_ERROR` (502)
//! - unparseable body → `UPSTREAM_INVALID_RESPONSE` (502)

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::models::config::OkxCredentials;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{de, Bridge, Token, TokenListKind, TokenPair};
use crate::utils::constants::SOLANA_CHAIN_INDEX;
use crate::utils::signing::{okx_timestamp, signed_headers};

// ============================================
// ENDPOINTS
// ============================================

const PATH_BRIDGES: &str = "/api/v5/dex/cross-chain/supported/bridges";
const PATH_PAIRS: &str = "/api/v5/dex/cross-chain/supported/bridge-tokens-pairs";
const PATH_ALL_TOKENS: &str = "/api/v5/dex/aggregator/all-tokens";
const PATH_CROSS_CHAIN_TOKENS: &str = "/api/v5/dex/cross-chain/supported/tokens";
const PATH_QUOTE: &str = "/api/v5/dex/cross-chain/quote";
const PATH_BUILD_TX: &str = "/api/v5/dex/cross-chain/build-tx";

/// Validated parameters of a cross-chain quote / build-tx call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossChainQuery {
    pub from_chain_index: String,
    pub to_chain_index: String,
    pub from_chain_id: String,
    pub to_chain_id: String,
    pub from_token_address: String,
    pub to_token_address: String,
    pub amount: String,
    pub slippage: String,
    /// Required for build-tx, absent for quotes
    pub user_wallet_address: Option<String>,
    pub sort: Option<String>,
    pub dex_ids: Option<String>,
    pub receive_address: Option<String>,
    pub fee_percent: Option<String>,
    pub referrer_address: Option<String>,
    pub price_impact_protection_percentage: Option<String>,
    pub only_bridge: Option<String>,
    pub memo: Option<String>,
    pub allow_bridge: Option<Vec<Value>>,
    pub deny_bridge: Option<Vec<Value>>,
}

impl CrossChainQuery {
    /// Query parameters in a fixed order; optional ones only when set
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("fromChainIndex", self.from_chain_index.clone()),
            ("toChainIndex", self.to_chain_index.clone()),
            ("fromChainId", self.from_chain_id.clone()),
            ("toChainId", self.to_chain_id.clone()),
            ("fromTokenAddress", self.from_token_address.clone()),
            ("toTokenAddress", self.to_token_address.clone()),
            ("amount", self.amount.clone()),
            ("slippage", self.slippage.clone()),
        ];

        let optional = [
            ("userWalletAddress", &self.user_wallet_address),
            ("sort", &self.sort),
            ("dexIds", &self.dex_ids),
            ("receiveAddress", &self.receive_address),
            ("feePercent", &self.fee_percent),
            ("referrerAddress", &self.referrer_address),
            (
                "priceImpactProtectionPercentage",
                &self.price_impact_protection_percentage,
            ),
            ("onlyBridge", &self.only_bridge),
            ("memo", &self.memo),
        ];
        pairs.extend(
            optional
                .into_iter()
                .filter_map(|(k, v)| v.as_ref().map(|v| (k, v.clone()))),
        );

        // Bridge filters travel as JSON-encoded arrays
        let filters = [
            ("allowBridge", &self.allow_bridge),
            ("denyBridge", &self.deny_bridge),
        ];
        for (key, list) in filters {
            if let Some(list) = list.as_ref().filter(|l| !l.is_empty()) {
                pairs.push((key, Value::Array(list.clone()).to_string()));
            }
        }

        pairs
    }
}

/// Every OKX request the proxy is allowed to make
#[derive(Debug, Clone, PartialEq)]
pub enum OkxEndpoint {
    Bridges { chain_index: String },
    Pairs { from_chain_index: String },
    AllTokens { chain_index: String },
    CrossChainTokens { chain_index: String },
    Quote(CrossChainQuery),
    BuildTx(CrossChainQuery),
}

impl OkxEndpoint {
    /// Token list endpoint for the requested list kind
    pub fn tokens(chain_index: impl Into<String>, kind: TokenListKind) -> Self {
        let chain_index = chain_index.into();
        match kind {
            TokenListKind::ChainTokens => Self::AllTokens { chain_index },
            TokenListKind::CrossChainSupported => Self::CrossChainTokens { chain_index },
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Bridges { .. } => PATH_BRIDGES,
            Self::Pairs { .. } => PATH_PAIRS,
            Self::AllTokens { .. } => PATH_ALL_TOKENS,
            Self::CrossChainTokens { .. } => PATH_CROSS_CHAIN_TOKENS,
            Self::Quote(_) => PATH_QUOTE,
            Self::BuildTx(_) => PATH_BUILD_TX,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bridges { .. } => "bridges",
            Self::Pairs { .. } => "pairs",
            Self::AllTokens { .. } => "all-tokens",
            Self::CrossChainTokens { .. } => "cross-chain-tokens",
            Self::Quote(_) => "quote",
            Self::BuildTx(_) => "build-tx",
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Bridges { chain_index }
            | Self::AllTokens { chain_index }
            | Self::CrossChainTokens { chain_index } => {
                vec![("chainIndex", chain_index.clone())]
            }
            Self::Pairs { from_chain_index } => vec![("fromChainIndex", from_chain_index.clone())],
            Self::Quote(query) | Self::BuildTx(query) => query.query_pairs(),
        }
    }

    /// Absolute URL against `base_url`
    pub fn url(&self, base_url: &str) -> AppResult<reqwest::Url> {
        let base = format!("{}{}", base_url.trim_end_matches('/'), self.path());
        reqwest::Url::parse_with_params(&base, self.query_pairs())
            .map_err(|e| AppError::internal(format!("Invalid OKX URL {}: {}", base, e)))
    }
}

/// `path?query` exactly as sent, which is what gets signed
fn request_path(url: &reqwest::Url) -> String {
    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", url.path(), query),
        _ => url.path().to_string(),
    }
}

// ============================================
// RAW OKX SHAPES
// ============================================

/// Token row as returned by both OKX token list endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOkxToken {
    token_symbol: String,
    #[serde(default)]
    token_name: String,
    token_contract_address: String,
    #[serde(default, deserialize_with = "de::u8_lenient")]
    decimals: u8,
    #[serde(default)]
    token_logo_url: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    chain_index: Option<String>,
}

impl RawOkxToken {
    fn into_token(self, requested_chain: &str) -> Token {
        Token {
            symbol: self.token_symbol,
            name: self.token_name,
            address: self.token_contract_address,
            decimals: self.decimals,
            logo_url: self.token_logo_url.filter(|u| !u.is_empty()),
            chain_index: self
                .chain_index
                .unwrap_or_else(|| requested_chain.to_string()),
        }
    }
}

/// Deserialize `body.data` item by item, skipping rows that don't parse
fn data_rows<T: DeserializeOwned>(body: &Value, endpoint: &str) -> AppResult<Vec<T>> {
    let rows = match body.get("data") {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            return Err(AppError::invalid_response(format!(
                "OKX {} returned non-array data: {}",
                endpoint, other
            )))
        }
    };

    let mut parsed = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        match serde_json::from_value::<T>(row.clone()) {
            Ok(item) => parsed.push(item),
            Err(e) => {
                skipped += 1;
                debug!("Skipping malformed {} row: {}", endpoint, e);
            }
        }
    }
    if skipped > 0 {
        warn!("⚠️ OKX {}: skipped {} malformed rows", endpoint, skipped);
    }
    Ok(parsed)
}

// ============================================
// CLIENT
// ============================================

/// Signed OKX DEX API client
pub struct OkxClient {
    base_url: String,
    credentials: OkxCredentials,
    transport: Arc<dyn HttpTransport>,
}

impl OkxClient {
    pub fn new(
        base_url: impl Into<String>,
        credentials: OkxCredentials,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            transport,
        }
    }

    /// Issue a signed request and return the full OKX body (`{code, msg, data}`)
    pub async fn request(&self, endpoint: &OkxEndpoint) -> AppResult<Value> {
        let url = endpoint.url(&self.base_url)?;
        let path = request_path(&url);
        let timestamp = okx_timestamp();
        let headers = signed_headers(&self.credentials, &timestamp, "GET", &path, "")?;

        debug!(endpoint = endpoint.name(), path = %path, "🔏 Signed OKX request");
        let response = self
            .transport
            .execute(HttpRequest::get(url.as_str()).with_headers(headers))
            .await?;

        Self::check_response(endpoint.name(), response)
    }

    fn check_response(endpoint: &str, response: HttpResponse) -> AppResult<Value> {
        if response.is_rate_limited() {
            warn!("🚦 OKX rate limited {}", endpoint);
            return Err(AppError {
                upstream_status: Some(429),
                ..AppError::new(
                    ErrorCode::RateLimitExceeded,
                    format!("OKX rate limit hit on {}", endpoint),
                )
            });
        }

        if !response.is_success() {
            warn!("❌ OKX {} returned HTTP {}", endpoint, response.status);
            return Err(AppError::upstream(
                response.status,
                format!("OKX API error: {}", response.error_message()),
            ));
        }

        let body: Value = response.json()?;
        let code = body
            .get("code")
            .map(|c| match c {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "0".to_string());

        if code != "0" {
            let msg = body
                .get("msg")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or("Unknown error");
            warn!("❌ OKX {} error code {}: {}", endpoint, code, msg);
            return Err(AppError::upstream_api(format!(
                "OKX API error {}: {}",
                code, msg
            )));
        }

        Ok(body)
    }

    /// Bridges usable from `chain_index`, with `supports_solana` filled in
    pub async fn get_bridges(&self, chain_index: &str) -> AppResult<Vec<Bridge>> {
        let endpoint = OkxEndpoint::Bridges {
            chain_index: chain_index.to_string(),
        };
        let body = self.request(&endpoint).await?;
        let mut bridges: Vec<Bridge> = data_rows(&body, endpoint.name())?;
        for bridge in &mut bridges {
            bridge.supports_solana = bridge
                .supported_chains
                .iter()
                .any(|c| c == SOLANA_CHAIN_INDEX);
        }
        info!("🌉 Loaded {} bridges for chain {}", bridges.len(), chain_index);
        Ok(bridges)
    }

    /// Token pairs starting on `from_chain_index`, with stable `pair_id`s
    pub async fn get_pairs(&self, from_chain_index: &str) -> AppResult<Vec<TokenPair>> {
        let endpoint = OkxEndpoint::Pairs {
            from_chain_index: from_chain_index.to_string(),
        };
        let body = self.request(&endpoint).await?;
        let mut pairs: Vec<TokenPair> = data_rows(&body, endpoint.name())?;
        for pair in &mut pairs {
            pair.pair_id = TokenPair::make_id(
                &pair.from_chain_index,
                &pair.from_token_symbol,
                &pair.to_chain_index,
                &pair.to_token_symbol,
            );
        }
        info!("🔗 Loaded {} pairs from chain {}", pairs.len(), from_chain_index);
        Ok(pairs)
    }

    pub async fn get_tokens(
        &self,
        chain_index: &str,
        kind: TokenListKind,
    ) -> AppResult<Vec<Token>> {
        let endpoint = OkxEndpoint::tokens(chain_index, kind);
        let body = self.request(&endpoint).await?;
        let tokens: Vec<Token> = data_rows::<RawOkxToken>(&body, endpoint.name())?
            .into_iter()
            .map(|raw| raw.into_token(chain_index))
            .collect();
        info!("🪙 Loaded {} {} tokens for chain {}", tokens.len(), kind, chain_index);
        Ok(tokens)
    }

    /// Cross-chain quote, raw OKX body
    pub async fn quote(&self, query: CrossChainQuery) -> AppResult<Value> {
        self.request(&OkxEndpoint::Quote(query)).await
    }

    /// Cross-chain build-tx, raw OKX body
    pub async fn build_tx(&self, query: CrossChainQuery) -> AppResult<Value> {
        self.request(&OkxEndpoint::BuildTx(query)).await
    }
}
