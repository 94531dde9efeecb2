//! Jupiter API Client
//!
//! Unsigned pass-through to Jupiter's public quote and strict token list.
//! Free, no API key required.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use super::transport::{HttpRequest, HttpTransport};
use crate::models::errors::{AppError, AppResult, ErrorCode};

/// Default slippage for Jupiter quotes (0.5%)
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

/// Query of `GET /api/quote`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JupiterQuoteParams {
    #[serde(default)]
    pub input_mint: Option<String>,
    #[serde(default)]
    pub output_mint: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub slippage_bps: Option<u16>,
}

impl JupiterQuoteParams {
    /// Required params present, amount an integer in base units
    fn validated(&self) -> AppResult<Vec<(&'static str, String)>> {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        let (Some(input), Some(output), Some(amount)) = (
            non_empty(&self.input_mint),
            non_empty(&self.output_mint),
            non_empty(&self.amount),
        ) else {
            return Err(AppError::validation(
                "Missing required parameters: inputMint, outputMint, amount",
            ));
        };

        if !amount.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::validation("Invalid amount format."));
        }

        Ok(vec![
            ("inputMint", input),
            ("outputMint", output),
            ("amount", amount),
            (
                "slippageBps",
                self.slippage_bps.unwrap_or(DEFAULT_SLIPPAGE_BPS).to_string(),
            ),
        ])
    }
}

pub struct JupiterClient {
    quote_url: String,
    tokens_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl JupiterClient {
    pub fn new(
        quote_url: impl Into<String>,
        tokens_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            quote_url: quote_url.into(),
            tokens_url: tokens_url.into(),
            transport,
        }
    }

    async fn get_json(&self, url: &str, what: &str) -> AppResult<Value> {
        let response = self.transport.execute(HttpRequest::get(url)).await?;
        if response.is_rate_limited() {
            warn!("🚦 Jupiter rate limited {}", what);
            return Err(AppError {
                upstream_status: Some(429),
                ..AppError::new(
                    ErrorCode::RateLimitExceeded,
                    format!("Jupiter rate limit hit on {}", what),
                )
            });
        }
        if !response.is_success() {
            warn!("❌ Jupiter {} returned HTTP {}", what, response.status);
            return Err(AppError::upstream(
                response.status,
                format!("Jupiter API error: {}", response.error_message()),
            ));
        }
        response.json()
    }

    pub async fn quote(&self, params: &JupiterQuoteParams) -> AppResult<Value> {
        let query = params.validated()?;
        let url = reqwest::Url::parse_with_params(&self.quote_url, &query)
            .map_err(|e| AppError::internal(format!("Invalid Jupiter URL: {}", e)))?;
        info!("🪐 Jupiter quote {} → {}", query[0].1, query[1].1);
        self.get_json(url.as_str(), "quote").await
    }

    /// Strict (verified) token list
    pub async fn strict_tokens(&self) -> AppResult<Value> {
        let tokens = self.get_json(&self.tokens_url, "tokens").await?;
        if let Some(list) = tokens.as_array() {
            info!("🪐 Jupiter strict list: {} tokens", list.len());
        }
        Ok(tokens)
    }
}
