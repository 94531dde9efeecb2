//! OKX request signing (HMAC-SHA256, base64)
//!
//! Prehash is `timestamp + METHOD + requestPath + (query or body)`, where the
//! request path of a GET already carries its `?query`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::config::OkxCredentials;
use crate::models::errors::{AppError, AppResult, ErrorCode};

type HmacSha256 = Hmac<Sha256>;

/// Header names used by the OKX Web3 API
pub const HEADER_ACCESS_KEY: &str = "OK-ACCESS-KEY";
pub const HEADER_ACCESS_SIGN: &str = "OK-ACCESS-SIGN";
pub const HEADER_ACCESS_TIMESTAMP: &str = "OK-ACCESS-TIMESTAMP";
pub const HEADER_ACCESS_PASSPHRASE: &str = "OK-ACCESS-PASSPHRASE";
pub const HEADER_ACCESS_PROJECT: &str = "OK-ACCESS-PROJECT";

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-05-01T12:00:00.123Z`
pub fn okx_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

/// Build the string that gets signed
pub fn prehash(timestamp: &str, method: &str, request_path: &str, body: &str) -> String {
    format!("{}{}{}{}", timestamp, method.to_uppercase(), request_path, body)
}

/// Compute the base64 HMAC-SHA256 signature of a prehash string
pub fn sign(secret_key: &str, message: &str) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|e| {
            AppError::new(
                ErrorCode::ConfigInvalidValue,
                format!("Invalid secret key: {}", e),
            )
        })?;
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Full set of auth headers for one request
pub fn signed_headers(
    credentials: &OkxCredentials,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> AppResult<Vec<(String, String)>> {
    let signature = sign(
        credentials.secret_key(),
        &prehash(timestamp, method, request_path, body),
    )?;

    let mut headers = vec![
        (HEADER_ACCESS_KEY.to_string(), credentials.api_key().to_string()),
        (HEADER_ACCESS_SIGN.to_string(), signature),
        (HEADER_ACCESS_TIMESTAMP.to_string(), timestamp.to_string()),
        (HEADER_ACCESS_PASSPHRASE.to_string(), credentials.passphrase().to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
    ];
    if let Some(project) = credentials.project_id() {
        headers.push((HEADER_ACCESS_PROJECT.to_string(), project.to_string()));
    }
    Ok(headers)
}
