//! API Request Handlers

use axum::{
    body::Bytes,
    extract::{Json, Query, State},
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::types::*;
use crate::core::builder::{SwapRequest, TransactionBuilder};
use crate::models::config::ProxyConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{BridgesEnvelope, PairsEnvelope, TokenListKind, TokensEnvelope};
use crate::providers::jupiter::{JupiterClient, JupiterQuoteParams};
use crate::providers::okx::OkxClient;
use crate::providers::solana::{SolanaClient, WalletBalance};
use crate::providers::transport::HttpTransport;

/// Shared application state
pub struct AppState {
    pub config: ProxyConfig,
    pub okx: Arc<OkxClient>,
    pub builder: TransactionBuilder,
    pub jupiter: JupiterClient,
    pub solana: SolanaClient,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ProxyConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let okx = Arc::new(OkxClient::new(
            &config.okx_base_url,
            config.credentials.clone(),
            transport.clone(),
        ));
        let jupiter = JupiterClient::new(
            &config.jupiter_quote_url,
            &config.jupiter_tokens_url,
            transport.clone(),
        );
        let solana = SolanaClient::new(&config.solana_rpc_url, transport);

        Self {
            builder: TransactionBuilder::new(okx.clone()),
            okx,
            jupiter,
            solana,
            config,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Required, non-empty query parameter
fn required(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("Missing {} parameter", name)))
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// OKX reference data
// ============================================

pub async fn get_bridges(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChainIndexQuery>,
) -> Result<Json<BridgesEnvelope>, ApiFailure> {
    let chain_index = required(query.chain_index, "chainIndex").map_err(error_response)?;

    let bridges = state
        .okx
        .get_bridges(&chain_index)
        .await
        .map_err(error_response)?;

    Ok(Json(BridgesEnvelope {
        success: true,
        bridges,
        error: None,
    }))
}

pub async fn get_pairs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PairsQuery>,
) -> Result<Json<PairsEnvelope>, ApiFailure> {
    let from_chain_index =
        required(query.from_chain_index, "fromChainIndex").map_err(error_response)?;

    let pairs = state
        .okx
        .get_pairs(&from_chain_index)
        .await
        .map_err(error_response)?;

    Ok(Json(PairsEnvelope {
        success: true,
        pairs,
        error: None,
    }))
}

pub async fn get_tokens(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokensQuery>,
) -> Result<Json<TokensEnvelope>, ApiFailure> {
    let chain_index = required(query.chain_index, "chainIndex").map_err(error_response)?;
    let kind = match query.list_type.as_deref().map(str::trim) {
        None | Some("") => TokenListKind::default(),
        Some(raw) => raw.parse::<TokenListKind>().map_err(error_response)?,
    };

    let tokens = state
        .okx
        .get_tokens(&chain_index, kind)
        .await
        .map_err(error_response)?;

    Ok(Json(TokensEnvelope {
        success: true,
        tokens,
        error: None,
    }))
}

// ============================================
// Cross-chain swap (build-tx / quote)
// ============================================

pub async fn cross_chain_swap(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiFailure> {
    let start = Instant::now();

    let value: Value = serde_json::from_slice(&body)
        .map_err(|e| error_response(AppError::validation(format!("Invalid JSON body: {}", e))))?;
    let request = SwapRequest::from_value(value).map_err(error_response)?;
    let action = request.action();

    match state.builder.execute(request).await {
        Ok(response) => {
            info!(
                action,
                latency_ms = start.elapsed().as_millis() as u64,
                "🌉 Cross-chain {} forwarded",
                action
            );
            Ok(Json(response))
        }
        Err(e) => {
            warn!(action, code = e.code_str(), "Cross-chain {} failed: {}", action, e.message);
            Err(error_response(e))
        }
    }
}

// ============================================
// Jupiter pass-through
// ============================================

pub async fn jupiter_quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<JupiterQuoteParams>,
) -> Result<Json<Value>, ApiFailure> {
    state
        .jupiter
        .quote(&params)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn jupiter_tokens(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiFailure> {
    state
        .jupiter
        .strict_tokens()
        .await
        .map(Json)
        .map_err(error_response)
}

// ============================================
// Wallet balance
// ============================================

pub async fn wallet_balance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WalletBalanceQuery>,
) -> Result<Json<ApiResponse<WalletBalance>>, ApiFailure> {
    let start = Instant::now();
    let address = required(query.address, "address").map_err(error_response)?;

    let balance = state
        .solana
        .get_balance(&address)
        .await
        .map_err(error_response)?;

    Ok(Json(ApiResponse::success(
        balance,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}
