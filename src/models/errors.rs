//! Centralized Error Handling Module
//!
//! Every failure carries a unique error code so proxy logs and loader
//! output can be grepped by category.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - VALIDATION_xxx: request validation (never retried)
//! - UPSTREAM_xxx: OKX / Jupiter / Solana RPC failures
//! - PIPELINE_xxx: data loader state errors
//! - CFG_xxx: configuration errors

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Upstream HTTP status, when the error came from a remote service
    pub upstream_status: Option<u16>,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            upstream_status: None,
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            upstream_status: None,
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    /// HTTP status this error maps to
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Validation Errors
    // ============================================
    /// Missing or malformed request parameter
    ValidationFailed,

    // ============================================
    // Upstream Errors
    // ============================================
    /// Upstream answered HTTP 429 and the retry budget is spent
    RateLimitExceeded,
    /// Upstream answered non-2xx or an API-level error code
    UpstreamError,
    /// Upstream could not be reached (connect/DNS/timeout)
    UpstreamUnavailable,
    /// Upstream body could not be parsed
    UpstreamInvalidResponse,

    // ============================================
    // Pipeline Errors
    // ============================================
    /// A load pipeline is already running
    PipelineBusy,
    /// A pipeline step failed
    PipelineFailed,

    // ============================================
    // Configuration Errors
    // ============================================
    /// Missing environment variable
    ConfigMissingEnv,
    /// Invalid configuration value
    ConfigInvalidValue,

    // ============================================
    // Generic Errors
    // ============================================
    /// Internal server error
    Internal,
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",

            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamInvalidResponse => "UPSTREAM_INVALID_RESPONSE",

            Self::PipelineBusy => "PIPELINE_BUSY",
            Self::PipelineFailed => "PIPELINE_FAILED",

            Self::ConfigMissingEnv => "CFG_MISSING_ENV",
            Self::ConfigInvalidValue => "CFG_INVALID_VALUE",

            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationFailed | Self::ConfigInvalidValue => 400,
            Self::PipelineBusy => 409,
            Self::RateLimitExceeded => 429,
            Self::UpstreamError | Self::UpstreamInvalidResponse => 502,
            Self::UpstreamUnavailable => 503,
            _ => 500,
        }
    }

    /// Check if the generic (linear backoff) retry path may retry this error.
    /// Exhausted rate limits are final.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamError | Self::UpstreamUnavailable | Self::UpstreamInvalidResponse
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Request validation failed
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, msg)
    }

    /// Retry budget for HTTP 429 exhausted
    pub fn rate_limit_exceeded(name: &str, attempts: u32) -> Self {
        Self {
            upstream_status: Some(429),
            ..Self::new(
                ErrorCode::RateLimitExceeded,
                format!("Rate limit exceeded for {} after {} attempts", name, attempts),
            )
        }
    }

    /// Upstream returned a non-success status
    pub fn upstream(status: u16, msg: impl Into<String>) -> Self {
        Self {
            upstream_status: Some(status),
            ..Self::new(ErrorCode::UpstreamError, msg)
        }
    }

    /// Upstream API-level error (HTTP 200 with an error code in the body)
    pub fn upstream_api(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamError, msg)
    }

    /// Upstream unreachable
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamUnavailable, msg)
    }

    /// Upstream body malformed
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::UpstreamInvalidResponse, msg)
    }

    /// Loader already running
    pub fn pipeline_busy() -> Self {
        Self::new(ErrorCode::PipelineBusy, "Data loading already in progress")
    }

    /// Missing environment variable
    pub fn missing_env(name: &str) -> Self {
        Self::new(
            ErrorCode::ConfigMissingEnv,
            format!("Missing environment variable: {}", name),
        )
    }

    /// Internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorCode::Unknown, "IO error", err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::UpstreamUnavailable, "Request timeout")
        } else if err.is_connect() || err.is_request() {
            Self::with_source(ErrorCode::UpstreamUnavailable, "Connection failed", err)
        } else if err.is_decode() {
            Self::with_source(ErrorCode::UpstreamInvalidResponse, "Failed to decode response", err)
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::UpstreamInvalidResponse, "JSON parse error", err)
    }
}
