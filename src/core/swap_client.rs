//! Session-side build-tx call against the proxy

use std::sync::Arc;
use tracing::{info, warn};

use crate::core::builder::{SwapParams, SwapRequest};
use crate::core::loader::LoaderData;
use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::models::types::{SwapEnvelope, SwapResult};
use crate::providers::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Convert a decimal amount into integer base units (`"1.5"`, 9 → `"1500000000"`)
pub fn to_base_units(amount: &str, decimals: u8) -> AppResult<String> {
    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));

    let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) || amount.ends_with('.') {
        return Err(AppError::validation("Invalid amount format."));
    }
    if fraction.len() > decimals as usize {
        return Err(AppError::validation(format!(
            "Amount has more than {} decimal places",
            decimals
        )));
    }

    let padded = format!("{}{:0<width$}", whole, fraction, width = decimals as usize);
    let trimmed = padded.trim_start_matches('0');
    Ok(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
}

/// Build a `build-tx` request from the loader's current selection
pub fn build_tx_request(
    data: &LoaderData,
    amount: &str,
    slippage: &str,
    user_wallet_address: &str,
) -> AppResult<SwapRequest> {
    let selection = &data.selection;
    let (Some(from_chain), Some(to_chain), Some(from_token), Some(to_token)) = (
        selection.from_chain_index.clone(),
        selection.to_chain_index.clone(),
        selection.from_token.as_ref(),
        selection.to_token.as_ref(),
    ) else {
        return Err(AppError::validation("Please select both tokens."));
    };

    Ok(SwapRequest::BuildTx(SwapParams {
        from_chain_id: Some(from_chain.clone()),
        to_chain_id: Some(to_chain.clone()),
        from_chain_index: Some(from_chain),
        to_chain_index: Some(to_chain),
        from_token_address: Some(from_token.address.clone()),
        to_token_address: Some(to_token.address.clone()),
        amount: Some(to_base_units(amount, from_token.decimals)?),
        slippage: Some(slippage.to_string()),
        user_wallet_address: Some(user_wallet_address.to_string()),
        ..SwapParams::default()
    }))
}

/// Posts swap requests to the proxy's `/api/cross-chain-swap`
pub struct SwapClient {
    api_base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl SwapClient {
    pub fn new(api_base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    fn error_from(response: &HttpResponse) -> AppError {
        let message = response.error_message();
        match response.status {
            400 => AppError::validation(message),
            409 => AppError::new(ErrorCode::PipelineBusy, message),
            429 => AppError {
                upstream_status: Some(429),
                ..AppError::new(ErrorCode::RateLimitExceeded, message)
            },
            503 => AppError::unavailable(message),
            status => AppError::upstream(status, message),
        }
    }

    pub async fn build_transaction(&self, request: &SwapRequest) -> AppResult<Vec<SwapResult>> {
        let url = format!("{}/api/cross-chain-swap", self.api_base_url);
        let body = serde_json::to_string(request)?;

        info!("📤 Requesting {} from proxy", request.action());
        let response = self
            .transport
            .execute(HttpRequest::post_json(url, body))
            .await?;

        if !response.is_success() {
            let err = Self::error_from(&response);
            warn!("❌ {} rejected: {}", request.action(), err);
            return Err(err);
        }

        let envelope: SwapEnvelope = response.json()?;
        if !envelope.success {
            return Err(AppError::upstream_api(
                envelope
                    .error
                    .unwrap_or_else(|| "Swap request failed".to_string()),
            ));
        }

        info!("✅ Received {} swap route(s)", envelope.data.len());
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validator::RouteSelection;
    use crate::models::types::Token;
    use crate::providers::mock::MockTransport;
    use serde_json::json;

    fn token(symbol: &str, chain: &str, decimals: u8) -> Token {
        Token {
            symbol: symbol.into(),
            name: symbol.into(),
            address: format!("{}-addr", symbol),
            decimals,
            logo_url: None,
            chain_index: chain.into(),
        }
    }

    fn loaded() -> LoaderData {
        LoaderData {
            selection: RouteSelection::new("501", "1")
                .with_tokens(token("SOL", "501", 9), token("USDC", "1", 6)),
            ..LoaderData::default()
        }
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units("1.5", 9).unwrap(), "1500000000");
        assert_eq!(to_base_units("0.000001", 6).unwrap(), "1");
        assert_eq!(to_base_units("42", 0).unwrap(), "42");
        assert_eq!(to_base_units("0", 6).unwrap(), "0");
        assert!(to_base_units("abc", 6).is_err());
        assert!(to_base_units("1.", 6).is_err());
        assert!(to_base_units("0.1234567", 6).is_err());
    }

    #[test]
    fn test_build_tx_request_from_selection() {
        let request = build_tx_request(&loaded(), "2", "0.01", "Wallet111").unwrap();
        let params = request.params();
        assert_eq!(params.amount.as_deref(), Some("2000000000"));
        assert_eq!(params.from_token_address.as_deref(), Some("SOL-addr"));
        assert!(request.validate().is_ok());

        let empty = LoaderData::default();
        assert!(build_tx_request(&empty, "1", "0.01", "w").is_err());
    }

    #[tokio::test]
    async fn test_build_transaction_parses_results() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(
            "/api/cross-chain-swap",
            json!({
                "success": true,
                "timestamp": "2024-05-01T00:00:00Z",
                "fromChainIndex": "501",
                "toChainIndex": "1",
                "data": [{
                    "fromTokenAmount": "2000000000",
                    "toTokenAmount": "300000000",
                    "minmumReceive": "297000000",
                    "router": {"bridgeId": 211, "bridgeName": "Wormhole"},
                    "tx": {"to": "Prog111", "data": "base58data", "value": "0"}
                }]
            }),
        );
        let client = SwapClient::new("http://proxy.test/", mock.clone());
        let request = build_tx_request(&loaded(), "2", "0.01", "Wallet111").unwrap();

        let results = client.build_transaction(&request).await.unwrap();
        assert_eq!(results[0].minimum_receive, "297000000");
        assert_eq!(results[0].router.bridge_id.as_deref(), Some("211"));

        let sent = mock.calls()[0].request.clone();
        assert_eq!(sent.url, "http://proxy.test/api/cross-chain-swap");
        let body: serde_json::Value = serde_json::from_str(&sent.body.unwrap()).unwrap();
        assert_eq!(body["action"], "build-tx");
        assert_eq!(body["userWalletAddress"], "Wallet111");
        assert!(body.get("memo").is_none());
    }

    #[tokio::test]
    async fn test_build_transaction_maps_errors() {
        let mock = Arc::new(MockTransport::new());
        mock.push(
            "/api/cross-chain-swap",
            400,
            r#"{"success":false,"error":"Invalid amount format."}"#,
        );
        let client = SwapClient::new("http://proxy.test", mock);
        let request = build_tx_request(&loaded(), "2", "0.01", "Wallet111").unwrap();

        let err = client.build_transaction(&request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.message, "Invalid amount format.");
    }
}
