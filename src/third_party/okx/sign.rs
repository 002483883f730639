use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac, digest::InvalidLength};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// `2024-11-01T12:00:00.000Z`, the timestamp format OKX signs over.
pub fn access_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn prehash(timestamp: &str, method: &str, request_path: &str, body: &str) -> String {
    format!("{timestamp}{method}{request_path}{body}")
}

/// Base64 HMAC-SHA256 of the prehash string, keyed with the API secret.
pub fn sign(
    secret_key: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())?;
    mac.update(prehash(timestamp, method, request_path, body).as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
