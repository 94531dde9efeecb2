//! Cross-chain swap request validation and forwarding
//!
//! Validation is fail-fast, in this order:
//! 1. required parameters present and non-empty
//! 2. chain indices numeric
//! 3. amount a plain decimal
//! 4. slippage within [0.002, 0.5]
//! 5. one leg on Solana (chain index 501)

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult};
use crate::models::types::de::opt_string_or_number as opt_str;
use crate::providers::okx::{CrossChainQuery, OkxClient};
use crate::utils::constants::{MAX_SLIPPAGE, MIN_SLIPPAGE, SOLANA_CHAIN_INDEX};

lazy_static! {
    static ref CHAIN_INDEX_RE: Regex = Regex::new(r"^\d+$").expect("valid regex");
    static ref AMOUNT_RE: Regex = Regex::new(r"^\d+(\.\d+)?$").expect("valid regex");
}

/// Body of `POST /api/cross-chain-swap`, discriminated by `action`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum SwapRequest {
    BuildTx(SwapParams),
    Quote(SwapParams),
}

/// Parameters shared by both actions. Numbers and numeric strings are both accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapParams {
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub from_chain_index: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub to_chain_index: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub from_chain_id: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub to_chain_id: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub from_token_address: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub to_token_address: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub slippage: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub user_wallet_address: Option<String>,

    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub dex_ids: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub receive_address: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub fee_percent: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub referrer_address: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub price_impact_protection_percentage: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub only_bridge: Option<String>,
    #[serde(default, deserialize_with = "opt_str", skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, deserialize_with = "bridge_list", skip_serializing_if = "Option::is_none")]
    pub allow_bridge: Option<Vec<Value>>,
    #[serde(default, deserialize_with = "bridge_list", skip_serializing_if = "Option::is_none")]
    pub deny_bridge: Option<Vec<Value>>,
}

/// Bridge id lists arrive as arrays, JSON strings, comma lists or single ids
fn bridge_list<'de, D>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(items),
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => match serde_json::from_str::<Vec<Value>>(&s) {
            Ok(items) => Some(items),
            Err(_) => Some(
                s.split(',')
                    .map(|p| Value::String(p.trim().to_string()))
                    .collect(),
            ),
        },
        Some(other) => Some(vec![other]),
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> Option<String> {
    present(value).map(String::from)
}

impl SwapRequest {
    /// Parse a raw JSON body, reporting bad shapes as validation errors
    pub fn from_value(body: Value) -> AppResult<Self> {
        match body.get("action").and_then(|a| a.as_str()) {
            Some("build-tx") | Some("quote") => {}
            Some(other) => {
                return Err(AppError::validation(format!(
                    "Invalid action: {}. Expected build-tx or quote",
                    other
                )))
            }
            None => return Err(AppError::validation("Missing action")),
        }
        serde_json::from_value(body)
            .map_err(|e| AppError::validation(format!("Invalid request body: {}", e)))
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::BuildTx(_) => "build-tx",
            Self::Quote(_) => "quote",
        }
    }

    pub fn params(&self) -> &SwapParams {
        match self {
            Self::BuildTx(params) | Self::Quote(params) => params,
        }
    }

    /// Run every check and produce the query to forward
    pub fn validate(&self) -> AppResult<CrossChainQuery> {
        self.params().validate(matches!(self, Self::BuildTx(_)))
    }
}

impl SwapParams {
    fn required(&self, require_wallet: bool) -> Vec<(&'static str, &Option<String>)> {
        let mut fields = vec![
            ("fromChainIndex", &self.from_chain_index),
            ("toChainIndex", &self.to_chain_index),
            ("fromChainId", &self.from_chain_id),
            ("toChainId", &self.to_chain_id),
            ("fromTokenAddress", &self.from_token_address),
            ("toTokenAddress", &self.to_token_address),
            ("amount", &self.amount),
            ("slippage", &self.slippage),
        ];
        if require_wallet {
            fields.push(("userWalletAddress", &self.user_wallet_address));
        }
        fields
    }

    pub fn validate(&self, require_wallet: bool) -> AppResult<CrossChainQuery> {
        let missing: Vec<&str> = self
            .required(require_wallet)
            .into_iter()
            .filter(|(_, v)| present(v).is_none())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::validation(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )));
        }

        // Presence checked above
        let from_chain_index = owned(&self.from_chain_index).unwrap_or_default();
        let to_chain_index = owned(&self.to_chain_index).unwrap_or_default();
        let amount = owned(&self.amount).unwrap_or_default();
        let slippage = owned(&self.slippage).unwrap_or_default();

        if !CHAIN_INDEX_RE.is_match(&from_chain_index)
            || !CHAIN_INDEX_RE.is_match(&to_chain_index)
        {
            return Err(AppError::validation("Invalid chain index format"));
        }

        if !AMOUNT_RE.is_match(&amount) {
            return Err(AppError::validation("Invalid amount format."));
        }

        match slippage.parse::<f64>() {
            Ok(s) if (MIN_SLIPPAGE..=MAX_SLIPPAGE).contains(&s) => {}
            _ => {
                return Err(AppError::validation(format!(
                    "Invalid slippage: must be between {} and {}",
                    MIN_SLIPPAGE, MAX_SLIPPAGE
                )))
            }
        }

        if from_chain_index != SOLANA_CHAIN_INDEX && to_chain_index != SOLANA_CHAIN_INDEX {
            return Err(AppError::validation(format!(
                "At least one chain must be Solana (chain index {})",
                SOLANA_CHAIN_INDEX
            )));
        }

        Ok(CrossChainQuery {
            from_chain_index,
            to_chain_index,
            from_chain_id: owned(&self.from_chain_id).unwrap_or_default(),
            to_chain_id: owned(&self.to_chain_id).unwrap_or_default(),
            from_token_address: owned(&self.from_token_address).unwrap_or_default(),
            to_token_address: owned(&self.to_token_address).unwrap_or_default(),
            amount,
            slippage,
            user_wallet_address: if require_wallet {
                owned(&self.user_wallet_address)
            } else {
                None
            },
            sort: owned(&self.sort),
            dex_ids: owned(&self.dex_ids),
            receive_address: owned(&self.receive_address),
            fee_percent: owned(&self.fee_percent),
            referrer_address: owned(&self.referrer_address),
            price_impact_protection_percentage: owned(&self.price_impact_protection_percentage),
            only_bridge: owned(&self.only_bridge),
            memo: owned(&self.memo),
            allow_bridge: self.allow_bridge.clone(),
            deny_bridge: self.deny_bridge.clone(),
        })
    }
}

/// Merge `success`, `timestamp` and the echoed chain indices into an OKX body
pub fn with_request_metadata(body: Value, query: &CrossChainQuery) -> Value {
    let mut merged = match body {
        Value::Object(map) => map,
        other => {
            let mut map = serde_json::Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    merged.insert("success".to_string(), Value::Bool(true));
    merged.insert(
        "timestamp".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    merged.insert(
        "fromChainIndex".to_string(),
        Value::String(query.from_chain_index.clone()),
    );
    merged.insert(
        "toChainIndex".to_string(),
        Value::String(query.to_chain_index.clone()),
    );
    Value::Object(merged)
}

/// Validates swap requests and forwards them to OKX
pub struct TransactionBuilder {
    okx: Arc<OkxClient>,
}

impl TransactionBuilder {
    pub fn new(okx: Arc<OkxClient>) -> Self {
        Self { okx }
    }

    pub async fn execute(&self, request: SwapRequest) -> AppResult<Value> {
        let query = request.validate().map_err(|e| {
            warn!("🚫 Rejected {} request: {}", request.action(), e.message);
            e
        })?;

        info!(
            "🛠️ {} {} → {} amount={} slippage={}",
            request.action(),
            query.from_chain_index,
            query.to_chain_index,
            query.amount,
            query.slippage
        );

        let body = match request {
            SwapRequest::BuildTx(_) => self.okx.build_tx(query.clone()).await?,
            SwapRequest::Quote(_) => self.okx.quote(query.clone()).await?,
        };

        Ok(with_request_metadata(body, &query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::OkxCredentials;
    use crate::models::errors::ErrorCode;
    use crate::providers::mock::MockTransport;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "action": "build-tx",
            "fromChainIndex": "501",
            "toChainIndex": "1",
            "fromChainId": "501",
            "toChainId": 1,
            "fromTokenAddress": "So11111111111111111111111111111111111111112",
            "toTokenAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "amount": "1.5",
            "slippage": 0.01,
            "userWalletAddress": "Wallet111"
        })
    }

    fn with(field: &str, value: Value) -> Value {
        let mut body = valid_body();
        body[field] = value;
        body
    }

    fn validation_message(body: Value) -> String {
        let err = SwapRequest::from_value(body)
            .and_then(|r| r.validate())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        err.message
    }

    #[test]
    fn test_valid_request() {
        let query = SwapRequest::from_value(valid_body())
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(query.to_chain_id, "1");
        assert_eq!(query.slippage, "0.01");
        assert_eq!(query.user_wallet_address.as_deref(), Some("Wallet111"));
    }

    #[test]
    fn test_missing_parameters_listed() {
        let mut body = valid_body();
        body.as_object_mut().unwrap().remove("amount");
        body["userWalletAddress"] = json!("  ");
        let msg = validation_message(body);
        assert_eq!(msg, "Missing required parameters: amount, userWalletAddress");
    }

    #[test]
    fn test_invalid_amount() {
        assert_eq!(validation_message(with("amount", json!("abc"))), "Invalid amount format.");
        assert_eq!(validation_message(with("amount", json!("1."))), "Invalid amount format.");
        assert_eq!(validation_message(with("amount", json!("-1"))), "Invalid amount format.");
    }

    #[test]
    fn test_invalid_chain_index() {
        let msg = validation_message(with("fromChainIndex", json!("sol")));
        assert_eq!(msg, "Invalid chain index format");
    }

    #[test]
    fn test_slippage_bounds() {
        for ok in ["0.002", "0.5", "0.1"] {
            let request = SwapRequest::from_value(with("slippage", json!(ok))).unwrap();
            assert!(request.validate().is_ok(), "{} should pass", ok);
        }
        for bad in ["0.001", "0.51", "1", "lots"] {
            let msg = validation_message(with("slippage", json!(bad)));
            assert!(msg.starts_with("Invalid slippage"), "{} -> {}", bad, msg);
        }
    }

    #[test]
    fn test_requires_solana_leg() {
        let mut body = with("fromChainIndex", json!("56"));
        body["fromChainId"] = json!("56");
        let msg = validation_message(body);
        assert!(msg.contains("Solana"));
    }

    #[test]
    fn test_validation_order() {
        // amount and slippage both bad: amount reported first
        let mut body = with("amount", json!("abc"));
        body["slippage"] = json!("9");
        assert_eq!(validation_message(body), "Invalid amount format.");
    }

    #[test]
    fn test_quote_does_not_need_wallet() {
        let mut body = valid_body();
        body["action"] = json!("quote");
        body.as_object_mut().unwrap().remove("userWalletAddress");
        let request = SwapRequest::from_value(body).unwrap();
        assert!(matches!(request, SwapRequest::Quote(_)));
        assert!(request.validate().unwrap().user_wallet_address.is_none());
    }

    #[test]
    fn test_unknown_action() {
        let msg = validation_message(with("action", json!("approve")));
        assert!(msg.contains("Invalid action"));
    }

    #[test]
    fn test_bridge_lists_accept_many_shapes() {
        let body = with("allowBridge", json!("[211, 235]"));
        let query = SwapRequest::from_value(body).unwrap().validate().unwrap();
        assert_eq!(query.allow_bridge, Some(vec![json!(211), json!(235)]));

        let body = with("denyBridge", json!("211,235"));
        let query = SwapRequest::from_value(body).unwrap().validate().unwrap();
        assert_eq!(query.deny_bridge, Some(vec![json!("211"), json!("235")]));
    }

    #[test]
    fn test_metadata_merge() {
        let query = SwapRequest::from_value(valid_body()).unwrap().validate().unwrap();
        let merged = with_request_metadata(json!({"code": "0", "msg": "", "data": [{}]}), &query);
        assert_eq!(merged["success"], true);
        assert_eq!(merged["fromChainIndex"], "501");
        assert_eq!(merged["toChainIndex"], "1");
        assert!(merged["timestamp"].is_string());
        assert_eq!(merged["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_forwards_build_tx() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(
            "/cross-chain/build-tx",
            json!({"code": "0", "msg": "", "data": [{"fromTokenAmount": "1500000000", "minmumReceive": "99"}]}),
        );
        let okx = OkxClient::new(
            "https://okx.test",
            OkxCredentials::new("k", "s", "p", None),
            mock.clone(),
        );
        let builder = TransactionBuilder::new(Arc::new(okx));

        let response = builder
            .execute(SwapRequest::from_value(valid_body()).unwrap())
            .await
            .unwrap();
        assert_eq!(response["data"][0]["minmumReceive"], "99");

        let url = mock.urls()[0].clone();
        assert!(url.contains("userWalletAddress=Wallet111"));
        assert!(url.contains("amount=1.5"));
    }

    #[tokio::test]
    async fn test_execute_rejects_before_network() {
        let mock = Arc::new(MockTransport::new());
        let okx = OkxClient::new(
            "https://okx.test",
            OkxCredentials::new("k", "s", "p", None),
            mock.clone(),
        );
        let builder = TransactionBuilder::new(Arc::new(okx));

        let err = builder
            .execute(SwapRequest::from_value(with("amount", json!("abc"))).unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(mock.calls().is_empty());
    }
}
