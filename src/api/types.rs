//! API Request/Response Types

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::models::errors::AppError;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Error body. `error` is the single human-readable string clients display.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: i64,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: code.into(),
            details: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self::new(
            "RATE_LIMITED",
            format!("Rate limit exceeded. Retry after {} seconds", retry_after),
        )
        .with_details(format!("retry_after: {}", retry_after))
    }
}

/// Handler error: status plus JSON error body
pub type ApiFailure = (StatusCode, Json<ApiError>);

/// Map an application error onto its HTTP status and error body
pub fn error_response(err: AppError) -> ApiFailure {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Internal failures don't leak their message
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal server error".to_string()
    } else {
        err.message.clone()
    };

    let mut body = ApiError::new(err.code_str(), message);
    if let Some(upstream) = err.upstream_status {
        body = body.with_details(format!("upstream_status: {}", upstream));
    }
    (status, Json(body))
}

// ============================================
// Query strings
// ============================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainIndexQuery {
    pub chain_index: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairsQuery {
    pub from_chain_index: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokensQuery {
    pub chain_index: Option<String>,
    #[serde(rename = "type")]
    pub list_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WalletBalanceQuery {
    pub address: Option<String>,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
