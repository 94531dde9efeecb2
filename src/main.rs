//! Solbridge session client
//!
//! Talks to a running `solbridge_api`:
//! 1. loads bridges, pairs and token lists through the rate-limited queue
//! 2. validates the configured route
//! 3. builds the swap transaction when `SWAP_AMOUNT` and `USER_WALLET_ADDRESS` are set

use solbridge::core::{build_tx_request, LoadStep};
use solbridge::utils::chain_name;
use solbridge::{
    ClientConfig, DataLoader, HttpTransport, RateLimitedQueue, ReqwestTransport, SwapClient,
};

use eyre::Result;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    println!(
        r#"
    ╔══════════════════════════════════════════════════════╗
    ║                                                      ║
    ║                  S O L B R I D G E                   ║
    ║           Cross-chain session client  v0.1           ║
    ║                                                      ║
    ╚══════════════════════════════════════════════════════╝
    "#
    );

    let config = ClientConfig::from_env()?;
    info!("🔌 Proxy: {}", config.api_base_url);
    info!(
        "🧭 Route: {} → {}",
        chain_name(&config.from_chain_index),
        chain_name(&config.to_chain_index)
    );

    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
    let queue = RateLimitedQueue::new(transport.clone(), config.retry);
    let loader = DataLoader::new(queue, &config);

    // Progress reporter
    let mut progress = loader.subscribe();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let p = progress.borrow_and_update().clone();
            if p.current_step.is_loading() {
                info!(
                    "📊 [{}/{}] {:>3}% loading {}",
                    p.current_step_index,
                    p.total_steps,
                    p.progress,
                    p.current_step.name()
                );
            }
        }
    });

    // Run with graceful shutdown on Ctrl+C
    let loaded = tokio::select! {
        result = loader.load_all_data() => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n🛑 Shutting down gracefully...");
            reporter.abort();
            return Ok(());
        }
    };
    reporter.abort();

    if let Err(e) = loaded {
        error!("❌ Loading failed at {:?}: {}", loader.progress().current_step, e);
        return Err(e.into());
    }

    let data = loader.snapshot();
    info!("🌉 Bridges: {}", data.bridges.len());
    info!("🔗 Pairs: {}", data.pairs.len());
    info!(
        "🪙 Tokens: {} on {}, {} on {}",
        data.from_tokens.len(),
        chain_name(&config.from_chain_index),
        data.to_tokens.len(),
        chain_name(&config.to_chain_index)
    );

    let validation = loader.validation();
    if !validation.is_valid {
        warn!("🚫 {}", validation.message);
        return Ok(());
    }
    info!("✅ {}", validation.message);
    for bridge in &validation.available_bridges {
        info!("   • {} (id {})", bridge.bridge_name, bridge.bridge_id);
    }

    let (Some(amount), Some(wallet)) = (&config.swap_amount, &config.user_wallet_address) else {
        info!("ℹ️ Set SWAP_AMOUNT and USER_WALLET_ADDRESS to build a transaction");
        return Ok(());
    };

    let request = build_tx_request(&data, amount, &config.slippage, wallet)?;
    let client = SwapClient::new(&config.api_base_url, transport);
    let results = client.build_transaction(&request).await?;

    for (i, result) in results.iter().enumerate() {
        info!("📦 Route #{}", i + 1);
        info!(
            "   Bridge: {}",
            result.router.bridge_name.as_deref().unwrap_or("unknown")
        );
        info!("   From amount: {}", result.from_token_amount);
        info!("   To amount: {}", result.to_token_amount);
        info!("   Minimum receive: {}", result.minimum_receive);
        info!("   Tx to: {}", result.tx.to);
    }

    if loader.progress().current_step != LoadStep::Done {
        warn!("⚠️ Loader did not finish cleanly");
    }

    Ok(())
}
