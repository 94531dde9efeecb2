//! Solana JSON-RPC client
//!
//! Only what the proxy's portfolio view needs: `getBalance` for a wallet.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::transport::{HttpRequest, HttpTransport};
use crate::models::config::mask_url;
use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::LAMPORTS_PER_SOL;

/// `getBalance` result envelope (`{context, value}`)
#[derive(Debug, Clone, Deserialize)]
struct BalanceResult {
    value: u64,
}

/// Balance of one wallet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub address: String,
    pub lamports: u64,
    pub sol: f64,
}

impl WalletBalance {
    pub fn from_lamports(address: impl Into<String>, lamports: u64) -> Self {
        Self {
            address: address.into(),
            lamports,
            sol: lamports as f64 / LAMPORTS_PER_SOL as f64,
        }
    }
}

/// Solana RPC Client
pub struct SolanaClient {
    rpc_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl SolanaClient {
    pub fn new(rpc_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            transport,
        }
    }

    /// Execute JSON-RPC call
    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> AppResult<T> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        debug!(method, rpc = %mask_url(&self.rpc_url), "☀️ Solana RPC call");
        let response = self
            .transport
            .execute(HttpRequest::post_json(&self.rpc_url, payload.to_string()))
            .await?;

        if !response.is_success() {
            return Err(AppError::upstream(response.status, response.error_message()));
        }

        let json: serde_json::Value = response.json()?;
        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| error.to_string());
            return Err(AppError::upstream_api(format!("RPC error: {}", message)));
        }

        let result = json
            .get("result")
            .ok_or_else(|| AppError::invalid_response("No result in RPC response"))?;

        serde_json::from_value(result.clone()).map_err(|e| {
            AppError::invalid_response(format!("Failed to deserialize RPC result: {}", e))
        })
    }

    /// Lamport balance of `address`
    pub async fn get_balance(&self, address: &str) -> AppResult<WalletBalance> {
        let address = address.trim();
        if address.is_empty() {
            return Err(AppError::validation("Missing wallet address"));
        }

        let result: BalanceResult = self
            .call(
                "getBalance",
                serde_json::json!([address, {"commitment": "confirmed"}]),
            )
            .await?;

        Ok(WalletBalance::from_lamports(address, result.value))
    }
}
