//! Solbridge API Server
//!
//! Signed proxy for OKX cross-chain endpoints, plus Jupiter and Solana RPC
//!
//! Usage:
//!   cargo run --bin solbridge_api
//!
//! Environment:
//!   API_KEY, SECRET_KEY, PASSPHRASE - OKX credentials (required)
//!   PROJECT_ID                      - OKX project id (optional)
//!   SOLANA_RPC_URL                  - Solana RPC (default: public mainnet)
//!   SOLBRIDGE_PORT / PORT           - Server port (default: 8080)
//!   SOLBRIDGE_HOST                  - Server host (default: 0.0.0.0)
//!   RUST_LOG                        - Log level (default: info)

use solbridge::api::{create_router, start_cleanup_task, AppState};
use solbridge::{ProxyConfig, ReqwestTransport};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = match ProxyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("❌ {}", e);
            error!("   Set API_KEY, SECRET_KEY and PASSPHRASE for the OKX Web3 API");
            return Err(e.into());
        }
    };

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("🔗 OKX API: {}", config.okx_base_url);
    info!("☀️ Solana RPC: {}", config.masked_rpc_url());

    let transport = Arc::new(ReqwestTransport::new()?);
    let state = Arc::new(AppState::new(config, transport));

    // Start background cleanup task for rate limiter
    start_cleanup_task();
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    info!("🚀 Solbridge API starting on http://{}", addr);
    info!("");
    info!("Endpoints:");
    info!("  GET  /api/cross-chain-bridges?chainIndex=     - Supported bridges");
    info!("  GET  /api/cross-chain-pairs?fromChainIndex=   - Supported token pairs");
    info!("  GET  /api/cross-chain-tokens?chainIndex=&type= - Token list");
    info!("  POST /api/cross-chain-swap                    - build-tx / quote");
    info!("  GET  /api/quote                               - Jupiter quote");
    info!("  GET  /api/tokens                              - Jupiter strict tokens");
    info!("  GET  /api/wallet-balance?address=             - SOL balance");
    info!("  GET  /api/health                              - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");

    // Start server with graceful shutdown
    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received");
    info!("👋 Solbridge API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════════╗
    ║                                                      ║
    ║              S O L B R I D G E   A P I               ║
    ║        OKX cross-chain proxy for Solana  v0.1        ║
    ║                                                      ║
    ╚══════════════════════════════════════════════════════╝
    "#
    );
}
