//! Reference data loader
//!
//! Loads bridges, pairs, then the token lists of the selected chains, one
//! step at a time through the shared [`RateLimitedQueue`]. Progress is
//! published on a `watch` channel on every step transition.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::validator::{validate_pair, RouteSelection};
use crate::models::config::ClientConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    Bridge, BridgesEnvelope, PairValidationResult, PairsEnvelope, Token, TokenListKind,
    TokenPair, TokensEnvelope,
};
use crate::providers::queue::RateLimitedQueue;
use crate::utils::constants::{chain_name, DEFAULT_FROM_SYMBOL, DEFAULT_TO_SYMBOL};

/// Number of loading steps in a full run
pub const TOTAL_STEPS: usize = 4;

/// Where the loader is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", content = "reason", rename_all = "kebab-case")]
pub enum LoadStep {
    Idle,
    LoadingBridges,
    LoadingPairs,
    LoadingFromTokens,
    LoadingToTokens,
    Done,
    Failed(String),
}

impl LoadStep {
    /// 1-based index of a loading step, 0 when not loading
    pub fn index(&self) -> usize {
        match self {
            Self::LoadingBridges => 1,
            Self::LoadingPairs => 2,
            Self::LoadingFromTokens => 3,
            Self::LoadingToTokens => 4,
            Self::Done => TOTAL_STEPS,
            Self::Idle | Self::Failed(_) => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LoadingBridges => "bridges",
            Self::LoadingPairs => "pairs",
            Self::LoadingFromTokens => "from-tokens",
            Self::LoadingToTokens => "to-tokens",
            Self::Done => "done",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_loading(&self) -> bool {
        (1..=TOTAL_STEPS).contains(&self.index()) && *self != Self::Done
    }
}

/// Progress record published on every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadProgress {
    pub current_step: LoadStep,
    /// 0-100
    pub progress: u8,
    pub current_step_index: usize,
    pub total_steps: usize,
}

impl Default for LoadProgress {
    fn default() -> Self {
        Self {
            current_step: LoadStep::Idle,
            progress: 0,
            current_step_index: 0,
            total_steps: TOTAL_STEPS,
        }
    }
}

impl LoadProgress {
    /// Progress on entering `step`. A failure keeps the figures of the step that failed.
    pub fn advance(&self, step: LoadStep) -> Self {
        let (progress, current_step_index) = match &step {
            LoadStep::Idle => (0, 0),
            LoadStep::Done => (100, TOTAL_STEPS),
            LoadStep::Failed(_) => (self.progress, self.current_step_index),
            loading => {
                let k = loading.index();
                (((k - 1) * 100 / TOTAL_STEPS) as u8, k)
            }
        };
        Self {
            current_step: step,
            progress,
            current_step_index,
            total_steps: TOTAL_STEPS,
        }
    }
}

/// Everything the loader has fetched plus the current selection
#[derive(Debug, Clone, Default)]
pub struct LoaderData {
    pub bridges: Vec<Bridge>,
    pub pairs: Vec<TokenPair>,
    pub pairs_loaded: bool,
    pub from_tokens: Vec<Token>,
    pub to_tokens: Vec<Token>,
    pub selection: RouteSelection,
    /// Last user-visible failure
    pub error: Option<String>,
}

/// In-flight flag plus a token reload requested while a run was in flight
#[derive(Debug, Default)]
struct RunState {
    running: bool,
    reload_requested: bool,
}

/// Clears the in-flight flag when a run ends, however it ends
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
    held: bool,
}

impl<'a> RunGuard<'a> {
    fn acquire(state: &'a Mutex<RunState>) -> AppResult<Self> {
        let mut run = lock(state);
        if run.running {
            return Err(AppError::pipeline_busy());
        }
        run.running = true;
        Ok(Self { state, held: true })
    }

    /// Like `acquire`, but a busy pipeline records the reload for the running
    /// run to pick up instead of failing
    fn acquire_or_defer(state: &'a Mutex<RunState>) -> Option<Self> {
        let mut run = lock(state);
        if run.running {
            run.reload_requested = true;
            return None;
        }
        run.running = true;
        Some(Self { state, held: true })
    }

    /// Release the pipeline unless a reload was requested meanwhile, in which
    /// case the request is consumed and the pipeline stays held
    fn release_unless_reload(&mut self) -> bool {
        let mut run = lock(self.state);
        if std::mem::take(&mut run.reload_requested) {
            return true;
        }
        run.running = false;
        self.held = false;
        false
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.held {
            let mut run = lock(self.state);
            run.running = false;
            run.reload_requested = false;
        }
    }
}

struct LoaderInner {
    queue: RateLimitedQueue,
    api_base_url: String,
    initial_delay: Duration,
    reload_debounce: Duration,
    token_list: TokenListKind,
    data: Mutex<LoaderData>,
    progress: watch::Sender<LoadProgress>,
    run_state: Mutex<RunState>,
    pending_reload: Mutex<Option<JoinHandle<()>>>,
}

/// Session data loader. Clones share state.
#[derive(Clone)]
pub struct DataLoader {
    inner: Arc<LoaderInner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Prefer `symbol`, else the first token
fn pick_default(tokens: &[Token], symbol: &str) -> Option<Token> {
    tokens
        .iter()
        .find(|t| t.symbol == symbol)
        .or_else(|| tokens.first())
        .cloned()
}

impl DataLoader {
    pub fn new(queue: RateLimitedQueue, config: &ClientConfig) -> Self {
        let (progress, _) = watch::channel(LoadProgress::default());
        let data = LoaderData {
            selection: RouteSelection::new(&config.from_chain_index, &config.to_chain_index),
            ..LoaderData::default()
        };

        Self {
            inner: Arc::new(LoaderInner {
                queue,
                api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
                initial_delay: config.initial_delay,
                reload_debounce: config.reload_debounce,
                token_list: TokenListKind::ChainTokens,
                data: Mutex::new(data),
                progress,
                run_state: Mutex::new(RunState::default()),
                pending_reload: Mutex::new(None),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadProgress> {
        self.inner.progress.subscribe()
    }

    pub fn progress(&self) -> LoadProgress {
        self.inner.progress.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        lock(&self.inner.run_state).running
    }

    pub fn snapshot(&self) -> LoaderData {
        lock(&self.inner.data).clone()
    }

    /// Route validity for the current selection and loaded data
    pub fn validation(&self) -> PairValidationResult {
        let data = lock(&self.inner.data);
        validate_pair(&data.selection, &data.bridges, &data.pairs)
    }

    fn update<R>(&self, f: impl FnOnce(&mut LoaderData) -> R) -> R {
        f(&mut lock(&self.inner.data))
    }

    fn enter(&self, step: LoadStep) {
        info!("📶 Loader step: {}", step.name());
        self.inner
            .progress
            .send_modify(|current| *current = current.advance(step));
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> AppResult<String> {
        let base = format!("{}{}", self.inner.api_base_url, path);
        reqwest::Url::parse_with_params(&base, params)
            .map(String::from)
            .map_err(|e| AppError::internal(format!("Invalid API URL {}: {}", base, e)))
    }

    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: String, name: &str) -> AppResult<T> {
        let value = self
            .inner
            .queue
            .enqueue(url, name, self.inner.initial_delay)
            .await?;
        serde_json::from_value(value).map_err(|e| {
            AppError::invalid_response(format!("Unexpected {} response: {}", name, e))
        })
    }

    async fn fetch_bridges(&self, chain_index: &str) -> AppResult<Vec<Bridge>> {
        let url = self.url("/api/cross-chain-bridges", &[("chainIndex", chain_index)])?;
        let envelope: BridgesEnvelope = self.fetch(url, "bridges").await?;
        if !envelope.success {
            return Err(AppError::upstream_api(
                envelope.error.unwrap_or_else(|| "Failed to load bridges".to_string()),
            ));
        }
        Ok(envelope.bridges)
    }

    async fn fetch_pairs(&self, from_chain_index: &str) -> AppResult<Vec<TokenPair>> {
        let url = self.url("/api/cross-chain-pairs", &[("fromChainIndex", from_chain_index)])?;
        let envelope: PairsEnvelope = self.fetch(url, "pairs").await?;
        if !envelope.success {
            return Err(AppError::upstream_api(
                envelope.error.unwrap_or_else(|| "Failed to load pairs".to_string()),
            ));
        }
        Ok(envelope.pairs)
    }

    async fn fetch_tokens(&self, chain_index: &str, name: &str) -> AppResult<Vec<Token>> {
        let url = self.url(
            "/api/cross-chain-tokens",
            &[("chainIndex", chain_index), ("type", self.inner.token_list.as_str())],
        )?;
        let envelope: TokensEnvelope = self.fetch(url, name).await?;
        if !envelope.success {
            return Err(AppError::upstream_api(envelope.error.unwrap_or_else(|| {
                format!("Failed to load tokens for {}", chain_name(chain_index))
            })));
        }
        Ok(envelope.tokens)
    }

    fn selected_chains(&self) -> AppResult<(String, String)> {
        let data = lock(&self.inner.data);
        match (&data.selection.from_chain_index, &data.selection.to_chain_index) {
            (Some(from), Some(to)) => Ok((from.clone(), to.clone())),
            _ => Err(AppError::validation("Select both chains before loading")),
        }
    }

    /// Record the outcome of a run and publish the final step
    fn finish(&self, result: AppResult<()>) -> AppResult<()> {
        match &result {
            Ok(()) => {
                self.enter(LoadStep::Done);
                info!("✅ Data loading complete");
            }
            Err(e) => {
                error!("❌ Data loading failed: {}", e);
                self.update(|d| d.error = Some(e.message.clone()));
                self.enter(LoadStep::Failed(e.message.clone()));
            }
        }
        result
    }

    /// Publish the outcome, then re-run the token step for any chain change
    /// deferred while the pipeline was held
    async fn complete(&self, mut guard: RunGuard<'_>, mut result: AppResult<()>) -> AppResult<()> {
        loop {
            let outcome = self.finish(result);
            if !guard.release_unless_reload() {
                return outcome;
            }
            info!("🔁 Chain changed during the run, reloading tokens");
            self.update(|d| d.error = None);
            result = self.run_tokens().await;
        }
    }

    /// Reset everything, then bridges → pairs → from-tokens → to-tokens
    pub async fn load_all_data(&self) -> AppResult<()> {
        let guard = RunGuard::acquire(&self.inner.run_state)?;

        self.update(|d| {
            let selection = RouteSelection {
                from_token: None,
                to_token: None,
                ..d.selection.clone()
            };
            *d = LoaderData {
                selection,
                ..LoaderData::default()
            };
        });
        self.enter(LoadStep::Idle);

        let result = self.run_all().await;
        self.complete(guard, result).await
    }

    async fn run_all(&self) -> AppResult<()> {
        let (from_chain, _) = self.selected_chains()?;

        self.enter(LoadStep::LoadingBridges);
        let bridges = self.fetch_bridges(&from_chain).await?;
        self.update(|d| d.bridges = bridges);

        self.enter(LoadStep::LoadingPairs);
        let pairs = self.fetch_pairs(&from_chain).await?;
        self.update(|d| {
            d.pairs = pairs;
            d.pairs_loaded = true;
        });

        self.run_tokens().await
    }

    /// Reload both token lists for the selected chains and pick default tokens
    pub async fn load_tokens_for_chains(&self) -> AppResult<()> {
        let guard = RunGuard::acquire(&self.inner.run_state)?;
        self.reload_tokens(guard).await
    }

    async fn reload_tokens(&self, guard: RunGuard<'_>) -> AppResult<()> {
        self.update(|d| d.error = None);
        let result = self.run_tokens().await;
        self.complete(guard, result).await
    }

    async fn run_tokens(&self) -> AppResult<()> {
        let (from_chain, to_chain) = self.selected_chains()?;

        self.enter(LoadStep::LoadingFromTokens);
        let from_tokens = self.fetch_tokens(&from_chain, "from-tokens").await?;
        self.update(|d| {
            d.selection.from_token = pick_default(&from_tokens, DEFAULT_FROM_SYMBOL);
            d.from_tokens = from_tokens;
        });

        self.enter(LoadStep::LoadingToTokens);
        let to_tokens = self.fetch_tokens(&to_chain, "to-tokens").await?;
        self.update(|d| {
            d.selection.to_token = pick_default(&to_tokens, DEFAULT_TO_SYMBOL);
            d.to_tokens = to_tokens;
        });

        Ok(())
    }

    pub fn set_from_chain(&self, chain_index: impl Into<String>) {
        let chain_index = chain_index.into();
        self.update(|d| d.selection.from_chain_index = Some(chain_index));
        self.schedule_token_reload();
    }

    pub fn set_to_chain(&self, chain_index: impl Into<String>) {
        let chain_index = chain_index.into();
        self.update(|d| d.selection.to_chain_index = Some(chain_index));
        self.schedule_token_reload();
    }

    /// Select a from-token by symbol among the loaded from-chain tokens
    pub fn select_from_token(&self, symbol: &str) -> AppResult<()> {
        self.update(|d| {
            let token = d
                .from_tokens
                .iter()
                .find(|t| t.symbol == symbol)
                .cloned()
                .ok_or_else(|| AppError::validation(format!("Unknown from token: {}", symbol)))?;
            d.selection.from_token = Some(token);
            Ok(())
        })
    }

    /// Select a to-token by symbol among the loaded to-chain tokens
    pub fn select_to_token(&self, symbol: &str) -> AppResult<()> {
        self.update(|d| {
            let token = d
                .to_tokens
                .iter()
                .find(|t| t.symbol == symbol)
                .cloned()
                .ok_or_else(|| AppError::validation(format!("Unknown to token: {}", symbol)))?;
            d.selection.to_token = Some(token);
            Ok(())
        })
    }

    /// Debounced token reload; a newer chain change supersedes a pending one.
    /// If a run holds the pipeline when the debounce fires, that run reloads
    /// the tokens once it is done.
    fn schedule_token_reload(&self) {
        if !self.update(|d| d.pairs_loaded) {
            return;
        }

        let loader = self.clone();
        let debounce = self.inner.reload_debounce;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let Some(guard) = RunGuard::acquire_or_defer(&loader.inner.run_state) else {
                debug!("⏸️ Pipeline busy, token reload deferred to the running load");
                return;
            };
            if let Err(e) = loader.reload_tokens(guard).await {
                warn!("⚠️ Token reload failed: {}", e);
            }
        });

        if let Some(previous) = lock(&self.inner.pending_reload).replace(handle) {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::RetryPolicy;
    use crate::models::errors::ErrorCode;
    use crate::providers::mock::MockTransport;
    use serde_json::json;

    const BASE: &str = "http://proxy.test";

    fn config() -> ClientConfig {
        ClientConfig {
            api_base_url: BASE.to_string(),
            ..ClientConfig::default()
        }
    }

    fn loader(mock: Arc<MockTransport>) -> DataLoader {
        let queue = RateLimitedQueue::new(mock, RetryPolicy::default());
        DataLoader::new(queue, &config())
    }

    fn token_json(symbol: &str, chain: &str) -> serde_json::Value {
        json!({"symbol": symbol, "name": symbol, "address": format!("{}-{}", symbol, chain), "decimals": 6, "chainIndex": chain})
    }

    fn script_happy_path(mock: &MockTransport) {
        mock.push_json(
            "/api/cross-chain-bridges",
            json!({"success": true, "bridges": [
                {"bridgeId": "211", "bridgeName": "Wormhole", "supportedChains": ["1", "501"], "supportsSolana": true}
            ]}),
        );
        mock.push_json(
            "/api/cross-chain-pairs",
            json!({"success": true, "pairs": [
                {"fromChainIndex": "501", "toChainIndex": "1", "fromTokenSymbol": "SOL", "toTokenSymbol": "USDC", "pairId": "501:SOL->1:USDC"}
            ]}),
        );
        mock.push_json(
            "chainIndex=501&",
            json!({"success": true, "tokens": [token_json("BONK", "501"), token_json("SOL", "501")]}),
        );
        mock.push_json(
            "chainIndex=1&",
            json!({"success": true, "tokens": [token_json("WETH", "1"), token_json("USDC", "1")]}),
        );
    }

    #[test]
    fn test_progress_advance() {
        let start = LoadProgress::default();
        let p = start.advance(LoadStep::LoadingBridges);
        assert_eq!((p.progress, p.current_step_index), (0, 1));
        let p = p.advance(LoadStep::LoadingFromTokens);
        assert_eq!((p.progress, p.current_step_index), (50, 3));
        let failed = p.advance(LoadStep::Failed("boom".into()));
        assert_eq!((failed.progress, failed.current_step_index), (50, 3));
        let done = p.advance(LoadStep::Done);
        assert_eq!((done.progress, done.total_steps), (100, 4));
    }

    #[test]
    fn test_pick_default() {
        let tokens: Vec<Token> = vec![
            serde_json::from_value(token_json("BONK", "501")).unwrap(),
            serde_json::from_value(token_json("SOL", "501")).unwrap(),
        ];
        assert_eq!(pick_default(&tokens, "SOL").unwrap().symbol, "SOL");
        assert_eq!(pick_default(&tokens, "USDC").unwrap().symbol, "BONK");
        assert!(pick_default(&[], "SOL").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_all_data_in_order() {
        let mock = Arc::new(MockTransport::new());
        script_happy_path(&mock);
        let loader = loader(mock.clone());

        loader.load_all_data().await.unwrap();

        let urls = mock.urls();
        assert_eq!(urls.len(), 4);
        assert!(urls[0].contains("/api/cross-chain-bridges?chainIndex=501"));
        assert!(urls[1].contains("/api/cross-chain-pairs?fromChainIndex=501"));
        assert!(urls[2].contains("chainIndex=501&type=chain-tokens"));
        assert!(urls[3].contains("chainIndex=1&type=chain-tokens"));

        let progress = loader.progress();
        assert_eq!(progress.current_step, LoadStep::Done);
        assert_eq!(progress.progress, 100);

        let data = loader.snapshot();
        assert_eq!(data.selection.from_token.unwrap().symbol, "SOL");
        assert_eq!(data.selection.to_token.unwrap().symbol, "USDC");
        assert!(data.error.is_none());
        assert!(loader.validation().is_valid);
        assert!(!loader.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic() {
        let mock = Arc::new(MockTransport::new());
        script_happy_path(&mock);
        let loader = loader(mock);

        let mut rx = loader.subscribe();
        let collector = tokio::spawn(async move {
            let mut seen = Vec::new();
            while rx.changed().await.is_ok() {
                let p = rx.borrow_and_update().clone();
                let done = p.current_step == LoadStep::Done;
                seen.push(p);
                if done {
                    break;
                }
            }
            seen
        });

        loader.load_all_data().await.unwrap();
        let seen = collector.await.unwrap();

        assert_eq!(seen.last().unwrap().current_step, LoadStep::Done);
        let indices: Vec<usize> = seen
            .iter()
            .filter(|p| p.current_step.is_loading())
            .map(|p| p.current_step_index)
            .collect();
        assert!(indices.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_halts_and_keeps_loaded_data() {
        let failing = Arc::new(MockTransport::new());
        failing.push_json("/api/cross-chain-bridges", json!({"success": true, "bridges": []}));
        failing.push_json("/api/cross-chain-pairs", json!({"success": true, "pairs": []}));
        failing.push_json(
            "chainIndex=501&",
            json!({"success": true, "tokens": [token_json("SOL", "501")]}),
        );
        failing.push("chainIndex=1&", 500, r#"{"success":false,"error":"OKX API error: boom"}"#);
        let loader = loader(failing.clone());

        let err = loader.load_all_data().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UpstreamError);

        let data = loader.snapshot();
        assert_eq!(data.from_tokens.len(), 1);
        assert!(data.to_tokens.is_empty());
        assert!(data.error.unwrap().contains("boom"));
        assert!(matches!(loader.progress().current_step, LoadStep::Failed(_)));
        assert_eq!(loader.progress().current_step_index, 4);
        assert!(!loader.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsuccessful_envelope_fails_step() {
        let mock = Arc::new(MockTransport::new());
        mock.push_json(
            "/api/cross-chain-bridges",
            json!({"success": false, "error": "Missing credentials"}),
        );
        let loader = loader(mock.clone());

        let err = loader.load_all_data().await.unwrap_err();
        assert_eq!(err.message, "Missing credentials");
        assert_eq!(mock.calls().len(), 1);
        assert_eq!(loader.progress().current_step_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_run_rejected() {
        let mock = Arc::new(MockTransport::new());
        script_happy_path(&mock);
        let loader = loader(mock);

        let first = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load_all_data().await })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;

        let err = loader.load_all_data().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PipelineBusy);
        let err = loader.load_tokens_for_chains().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PipelineBusy);

        first.await.unwrap().unwrap();
        assert_eq!(loader.progress().current_step, LoadStep::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_change_reloads_tokens_debounced() {
        let mock = Arc::new(MockTransport::new());
        script_happy_path(&mock);
        mock.push_json(
            "chainIndex=56&",
            json!({"success": true, "tokens": [token_json("USDC", "56")]}),
        );
        let loader = loader(mock.clone());
        loader.load_all_data().await.unwrap();

        loader.set_to_chain("137");
        tokio::time::sleep(Duration::from_millis(100)).await;
        loader.set_to_chain("56");
        tokio::time::sleep(Duration::from_secs(60)).await;

        let urls = mock.urls();
        assert_eq!(urls.iter().filter(|u| u.contains("chainIndex=137&")).count(), 0);
        assert_eq!(urls.iter().filter(|u| u.contains("chainIndex=56&")).count(), 1);
        // bridges and pairs are not refetched
        assert_eq!(urls.iter().filter(|u| u.contains("cross-chain-pairs")).count(), 1);

        let data = loader.snapshot();
        assert_eq!(data.to_tokens[0].chain_index, "56");
        assert_eq!(loader.progress().current_step, LoadStep::Done);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_change_during_run_reloads_after() {
        let mock = Arc::new(MockTransport::new());
        script_happy_path(&mock);
        mock.push_json(
            "chainIndex=56&",
            json!({"success": true, "tokens": [token_json("USDC", "56")]}),
        );
        let loader = loader(mock.clone());

        let run = {
            let loader = loader.clone();
            tokio::spawn(async move { loader.load_all_data().await })
        };
        while !loader.snapshot().pairs_loaded {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        // debounce fires while the token steps still hold the pipeline
        loader.set_to_chain("56");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(loader.is_running());

        run.await.unwrap().unwrap();

        let urls = mock.urls();
        assert_eq!(urls.iter().filter(|u| u.contains("chainIndex=56&")).count(), 1);
        let data = loader.snapshot();
        assert_eq!(data.selection.to_chain_index.as_deref(), Some("56"));
        assert_eq!(data.to_tokens[0].chain_index, "56");
        assert_eq!(loader.progress().current_step, LoadStep::Done);
        assert!(!loader.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_change_before_pairs_does_nothing() {
        let mock = Arc::new(MockTransport::new());
        let loader = loader(mock.clone());

        loader.set_from_chain("1");
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(mock.calls().is_empty());
        assert_eq!(loader.snapshot().selection.from_chain_index.as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_tokens() {
        let mock = Arc::new(MockTransport::new());
        script_happy_path(&mock);
        let loader = loader(mock);
        loader.load_all_data().await.unwrap();

        loader.select_from_token("BONK").unwrap();
        assert!(!loader.validation().is_valid);
        assert!(loader.select_to_token("DOGE").is_err());
    }
}
