//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware};

/// Create the API router with all routes and middleware
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        // OKX cross-chain (signed)
        .route("/cross-chain-bridges", get(handlers::get_bridges))
        .route("/cross-chain-pairs", get(handlers::get_pairs))
        .route("/cross-chain-tokens", get(handlers::get_tokens))
        .route("/cross-chain-swap", post(handlers::cross_chain_swap))
        // Jupiter
        .route("/quote", get(handlers::jupiter_quote))
        .route("/tokens", get(handlers::jupiter_tokens))
        // Solana RPC
        .route("/wallet-balance", get(handlers::wallet_balance));

    Router::new()
        .nest("/api", api)
        .route("/health", get(handlers::health_check))
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(rate_limit_middleware))
}
