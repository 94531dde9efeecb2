//! Configuration module
//!
//! Everything is read from environment variables with defaults taken from
//! `utils/constants.rs`. OKX credentials are never logged.

use std::fmt;
use std::time::Duration;
use tracing::info;

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::utils::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_INITIAL_DELAY_MS, ETHEREUM_CHAIN_INDEX, JUPITER_QUOTE_URL,
    JUPITER_TOKENS_URL, LINEAR_BACKOFF_STEP_MS, MAX_BACKOFF_MS, MAX_RETRIES,
    MIN_REQUEST_DELAY_MS, OKX_BASE_URL, SOLANA_CHAIN_INDEX, SOLANA_PUBLIC_RPC_URL,
    TOKEN_RELOAD_DEBOUNCE_MS,
};

/// Read an env var, treating empty values as unset
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse a numeric env var
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> AppResult<T> {
    match env_opt(name) {
        Some(raw) => raw.trim().parse().map_err(|_| {
            AppError::new(
                ErrorCode::ConfigInvalidValue,
                format!("Invalid value for {}: {}", name, raw),
            )
        }),
        None => Ok(default),
    }
}

// ============================================
// OKX CREDENTIALS
// ============================================

/// OKX API credential triplet (+ optional project id)
#[derive(Clone)]
pub struct OkxCredentials {
    api_key: String,
    secret_key: String,
    passphrase: String,
    project_id: Option<String>,
}

impl OkxCredentials {
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
        project_id: Option<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase: passphrase.into(),
            project_id,
        }
    }

    /// Load `API_KEY`, `SECRET_KEY`, `PASSPHRASE` and optional `PROJECT_ID`
    pub fn from_env() -> AppResult<Self> {
        let api_key = env_opt("API_KEY").ok_or_else(|| AppError::missing_env("API_KEY"))?;
        let secret_key =
            env_opt("SECRET_KEY").ok_or_else(|| AppError::missing_env("SECRET_KEY"))?;
        let passphrase =
            env_opt("PASSPHRASE").ok_or_else(|| AppError::missing_env("PASSPHRASE"))?;
        info!("🔑 OKX credentials configured (values hidden)");
        Ok(Self::new(api_key, secret_key, passphrase, env_opt("PROJECT_ID")))
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }
}

impl fmt::Debug for OkxCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OkxCredentials")
            .field("api_key", &"***HIDDEN***")
            .field("secret_key", &"***HIDDEN***")
            .field("passphrase", &"***HIDDEN***")
            .field("project_id", &self.project_id)
            .finish()
    }
}

// ============================================
// RETRY POLICY
// ============================================

/// Spacing and backoff rules shared by every outbound call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Minimum time between the starts of two requests
    pub min_delay: Duration,
    /// Retry budget per request
    pub max_retries: u32,
    /// Cap for exponential (429) backoff
    pub max_backoff: Duration,
    /// Step for linear (generic failure) backoff
    pub linear_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(MIN_REQUEST_DELAY_MS),
            max_retries: MAX_RETRIES,
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
            linear_step: Duration::from_millis(LINEAR_BACKOFF_STEP_MS),
        }
    }
}

impl RetryPolicy {
    /// `SOLBRIDGE_MIN_DELAY_MS` / `SOLBRIDGE_MAX_RETRIES` override the defaults
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            min_delay: Duration::from_millis(env_parse(
                "SOLBRIDGE_MIN_DELAY_MS",
                MIN_REQUEST_DELAY_MS,
            )?),
            max_retries: env_parse("SOLBRIDGE_MAX_RETRIES", MAX_RETRIES)?,
            ..defaults
        })
    }

    /// Backoff after the `retries`-th HTTP 429: `min(initial * 2^retries, max_backoff)`
    pub fn rate_limit_backoff(&self, initial: Duration, retries: u32) -> Duration {
        let factor = 2u32.checked_pow(retries).unwrap_or(u32::MAX);
        initial
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Backoff after the `retries`-th generic failure: `linear_step * retries`
    pub fn linear_backoff(&self, retries: u32) -> Duration {
        self.linear_step.saturating_mul(retries)
    }

    /// Time still to wait so that two request starts are `min_delay` apart
    pub fn spacing_wait(&self, since_last: Option<Duration>) -> Duration {
        match since_last {
            Some(elapsed) => self.min_delay.saturating_sub(elapsed),
            None => Duration::ZERO,
        }
    }
}

// ============================================
// PROXY SERVER CONFIG
// ============================================

/// Configuration of the `solbridge_api` proxy
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub credentials: OkxCredentials,
    pub okx_base_url: String,
    pub jupiter_quote_url: String,
    pub jupiter_tokens_url: String,
    pub solana_rpc_url: String,
    pub host: String,
    pub port: u16,
}

impl ProxyConfig {
    pub fn new(credentials: OkxCredentials) -> Self {
        Self {
            credentials,
            okx_base_url: OKX_BASE_URL.to_string(),
            jupiter_quote_url: JUPITER_QUOTE_URL.to_string(),
            jupiter_tokens_url: JUPITER_TOKENS_URL.to_string(),
            solana_rpc_url: SOLANA_PUBLIC_RPC_URL.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }

    pub fn from_env() -> AppResult<Self> {
        let credentials = OkxCredentials::from_env()?;
        let defaults = Self::new(credentials);

        // PORT is what most hosts inject; SOLBRIDGE_PORT is for local runs
        let port = match env_opt("PORT") {
            Some(_) => env_parse("PORT", defaults.port)?,
            None => env_parse("SOLBRIDGE_PORT", defaults.port)?,
        };

        Ok(Self {
            okx_base_url: env_opt("OKX_BASE_URL").unwrap_or(defaults.okx_base_url),
            jupiter_quote_url: env_opt("JUPITER_QUOTE_URL").unwrap_or(defaults.jupiter_quote_url),
            jupiter_tokens_url: env_opt("JUPITER_TOKENS_URL")
                .unwrap_or(defaults.jupiter_tokens_url),
            solana_rpc_url: env_opt("SOLANA_RPC_URL").unwrap_or(defaults.solana_rpc_url),
            host: env_opt("SOLBRIDGE_HOST").unwrap_or(defaults.host),
            port,
            credentials: defaults.credentials,
        })
    }

    /// RPC URL with any path-embedded key masked for logging
    pub fn masked_rpc_url(&self) -> String {
        mask_url(&self.solana_rpc_url)
    }
}

/// Hide anything after the host of a URL that may embed an API key
pub fn mask_url(url: &str) -> String {
    match reqwest::Url::parse(url) {
        Ok(parsed) if parsed.path().len() > 1 || parsed.query().is_some() => format!(
            "{}://{}/***HIDDEN***",
            parsed.scheme(),
            parsed.host_str().unwrap_or_default()
        ),
        _ => url.to_string(),
    }
}

// ============================================
// LOADER CLIENT CONFIG
// ============================================

/// Configuration of the `solbridge` session client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the proxy
    pub api_base_url: String,
    pub retry: RetryPolicy,
    /// Base delay handed to every `enqueue`
    pub initial_delay: Duration,
    /// Debounce window for chain-change token reloads
    pub reload_debounce: Duration,
    pub from_chain_index: String,
    pub to_chain_index: String,
    pub swap_amount: Option<String>,
    pub user_wallet_address: Option<String>,
    pub slippage: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            reload_debounce: Duration::from_millis(TOKEN_RELOAD_DEBOUNCE_MS),
            from_chain_index: SOLANA_CHAIN_INDEX.to_string(),
            to_chain_index: ETHEREUM_CHAIN_INDEX.to_string(),
            swap_amount: None,
            user_wallet_address: None,
            slippage: "0.005".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            api_base_url: env_opt("SOLBRIDGE_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            retry: RetryPolicy::from_env()?,
            from_chain_index: env_opt("FROM_CHAIN_INDEX").unwrap_or(defaults.from_chain_index),
            to_chain_index: env_opt("TO_CHAIN_INDEX").unwrap_or(defaults.to_chain_index),
            swap_amount: env_opt("SWAP_AMOUNT"),
            user_wallet_address: env_opt("USER_WALLET_ADDRESS"),
            slippage: env_opt("SWAP_SLIPPAGE").unwrap_or(defaults.slippage),
            ..defaults
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_backoff_caps() {
        let policy = RetryPolicy::default();
        let initial = Duration::from_millis(2000);
        assert_eq!(policy.rate_limit_backoff(initial, 1), Duration::from_millis(4000));
        assert_eq!(policy.rate_limit_backoff(initial, 2), Duration::from_millis(8000));
        assert_eq!(policy.rate_limit_backoff(initial, 3), Duration::from_millis(16000));
        assert_eq!(policy.rate_limit_backoff(initial, 5), Duration::from_millis(30000));
        assert_eq!(policy.rate_limit_backoff(initial, 40), Duration::from_millis(30000));
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.linear_backoff(1), Duration::from_millis(3000));
        assert_eq!(policy.linear_backoff(2), Duration::from_millis(6000));
    }

    #[test]
    fn test_spacing_wait() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.spacing_wait(None), Duration::ZERO);
        assert_eq!(
            policy.spacing_wait(Some(Duration::from_millis(1500))),
            Duration::from_millis(3500)
        );
        assert_eq!(policy.spacing_wait(Some(Duration::from_secs(9))), Duration::ZERO);
    }

    #[test]
    fn test_credentials_debug_hidden() {
        let creds = OkxCredentials::new("my-key", "my-secret", "my-pass", None);
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("my-key"));
        assert!(!printed.contains("my-secret"));
        assert!(!printed.contains("my-pass"));
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://mainnet.helius-rpc.com/?api-key=abc"),
            "https://mainnet.helius-rpc.com/***HIDDEN***"
        );
        assert_eq!(
            mask_url("https://api.mainnet-beta.solana.com"),
            "https://api.mainnet-beta.solana.com"
        );
    }
}
