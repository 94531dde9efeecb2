//! Shared fixtures: a scripted fake upstream and an in-process router transport

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Value};
use solbridge::api::{create_router, AppState};
use solbridge::models::errors::{AppError, AppResult};
use solbridge::providers::{HttpRequest, HttpResponse, HttpTransport};
use solbridge::{OkxCredentials, ProxyConfig};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const OKX_BASE: &str = "https://okx.test";
pub const API_KEY: &str = "test-key";
pub const SECRET_KEY: &str = "test-secret";
pub const PASSPHRASE: &str = "test-pass";
pub const PROJECT_ID: &str = "test-project";

#[derive(Clone)]
enum Reply {
    Response(u16, String),
    NetworkError,
}

/// Upstream stand-in. Routes match by URL substring in insertion order;
/// the last reply of a route repeats.
#[derive(Default)]
pub struct FakeUpstream {
    routes: Mutex<Vec<(String, VecDeque<Reply>)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeUpstream {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, fragment: &str, reply: Reply) {
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|(k, _)| k == fragment) {
            Some((_, replies)) => replies.push_back(reply),
            None => routes.push((fragment.to_string(), VecDeque::from([reply]))),
        }
    }

    pub fn reply(&self, fragment: &str, status: u16, body: Value) {
        self.push(fragment, Reply::Response(status, body.to_string()));
    }

    /// OKX-style success body around `data`
    pub fn okx_ok(&self, fragment: &str, data: Value) {
        self.reply(fragment, 200, json!({"code": "0", "msg": "", "data": data}));
    }

    pub fn network_error(&self, fragment: &str) {
        self.push(fragment, Reply::NetworkError);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, fragment: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl HttpTransport for FakeUpstream {
    async fn execute(&self, request: HttpRequest) -> AppResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let reply = {
            let mut routes = self.routes.lock().unwrap();
            routes
                .iter_mut()
                .find(|(k, _)| request.url.contains(k.as_str()))
                .and_then(|(_, replies)| {
                    if replies.len() > 1 {
                        replies.pop_front()
                    } else {
                        replies.front().cloned()
                    }
                })
        };

        match reply {
            Some(Reply::Response(status, body)) => Ok(HttpResponse::new(status, body)),
            Some(Reply::NetworkError) => Err(AppError::unavailable("connection refused")),
            None => Ok(HttpResponse::new(404, r#"{"msg":"not found"}"#)),
        }
    }
}

pub fn proxy_config() -> ProxyConfig {
    let credentials = OkxCredentials::new(
        API_KEY,
        SECRET_KEY,
        PASSPHRASE,
        Some(PROJECT_ID.to_string()),
    );
    ProxyConfig {
        okx_base_url: OKX_BASE.to_string(),
        jupiter_quote_url: "https://jup.test/v6/quote".to_string(),
        jupiter_tokens_url: "https://jup.test/strict".to_string(),
        solana_rpc_url: "https://rpc.test".to_string(),
        ..ProxyConfig::new(credentials)
    }
}

/// Proxy router wired to `upstream`
pub fn proxy_router(upstream: Arc<FakeUpstream>) -> Router {
    create_router(Arc::new(AppState::new(proxy_config(), upstream)))
}

/// Client-side transport that feeds requests straight into a `Router`
pub struct RouterTransport {
    router: Router,
}

impl RouterTransport {
    pub fn new(router: Router) -> Arc<Self> {
        Arc::new(Self { router })
    }
}

#[async_trait]
impl HttpTransport for RouterTransport {
    async fn execute(&self, request: HttpRequest) -> AppResult<HttpResponse> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| AppError::internal(format!("bad url: {}", e)))?;
        let path_and_query = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let mut builder = axum::http::Request::builder()
            .method(request.method.as_str())
            .uri(path_and_query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let http_request = builder
            .body(axum::body::Body::from(request.body.unwrap_or_default()))
            .map_err(|e| AppError::internal(e.to_string()))?;

        let response = self
            .router
            .clone()
            .oneshot(http_request)
            .await
            .map_err(|e| -> AppError { match e {} })?;

        let status = response.status().as_u16();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| AppError::unavailable(e.to_string()))?;
        Ok(HttpResponse::new(status, String::from_utf8_lossy(&bytes)))
    }
}

/// Bridges / pairs / tokens for a Solana → Ethereum session
pub fn script_reference_data(upstream: &FakeUpstream) {
    upstream.okx_ok(
        "/supported/bridges",
        json!([
            {"bridgeId": 211, "bridgeName": "Wormhole", "requireOtherNativeFee": false, "supportedChains": ["1", "501", "56"]},
            {"bridgeId": 235, "bridgeName": "deBridge", "requireOtherNativeFee": true, "supportedChains": ["501", "56"]}
        ]),
    );
    upstream.okx_ok(
        "/bridge-tokens-pairs",
        json!([
            {"fromChainIndex": "501", "toChainIndex": "1", "fromTokenAddress": "So11111111111111111111111111111111111111112",
             "toTokenAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "fromTokenSymbol": "SOL", "toTokenSymbol": "USDC"},
            {"fromChainIndex": "501", "toChainIndex": "56", "fromTokenAddress": "So11111111111111111111111111111111111111112",
             "toTokenAddress": "0x55d398326f99059ff775485246999027b3197955", "fromTokenSymbol": "SOL", "toTokenSymbol": "USDT"}
        ]),
    );
    upstream.okx_ok(
        "all-tokens?chainIndex=501",
        json!([
            {"tokenSymbol": "USDC", "tokenName": "USD Coin", "tokenContractAddress": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", "decimals": "6"},
            {"tokenSymbol": "SOL", "tokenName": "Solana", "tokenContractAddress": "So11111111111111111111111111111111111111112", "decimals": "9"}
        ]),
    );
    upstream.okx_ok(
        "all-tokens?chainIndex=1",
        json!([
            {"tokenSymbol": "USDC", "tokenName": "USD Coin", "tokenContractAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", "decimals": "6"},
            {"tokenSymbol": "WETH", "tokenName": "Wrapped Ether", "tokenContractAddress": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "decimals": "18"}
        ]),
    );
}

pub fn build_tx_data() -> Value {
    json!([{
        "fromTokenAmount": "1500000000",
        "toTokenAmount": "225000000",
        "minmumReceive": "223875000",
        "router": {"bridgeId": 211, "bridgeName": "Wormhole", "otherNativeFee": "0", "crossChainFee": "0.1"},
        "tx": {"from": "Wallet111", "to": "worm2ZoG2kUd4vFXhvjh93UUH596ayRfgQ2MgjNMTth", "data": "3Bxs4h24hBtQy9rw", "value": "0"}
    }])
}
