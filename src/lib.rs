//! Solbridge Library
//!
//! Cross-chain swap plumbing for Solana:
//! - Signed proxy in front of OKX's DEX cross-chain API (plus Jupiter and Solana RPC)
//! - Rate-limited, retrying request queue
//! - Ordered bridges → pairs → tokens data loading with progress
//! - Route validation and build-tx request validation

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod utils;

pub use crate::core::{
    build_tx_request, validate_pair, DataLoader, LoadProgress, LoadStep, RouteSelection,
    SwapClient, SwapRequest, TransactionBuilder,
};
pub use models::{
    AppError, AppResult, Bridge, Chain, ClientConfig, ErrorCode, OkxCredentials,
    PairValidationResult, ProxyConfig, RetryPolicy, SwapResult, Token, TokenPair,
};
pub use providers::{HttpTransport, OkxClient, OkxEndpoint, RateLimitedQueue, ReqwestTransport};
