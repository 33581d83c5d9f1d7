//! HMAC-SHA256 signing of webhook bodies.
//!
//! The signed message is `"{timestamp}.{body}"` where `timestamp` is Unix
//! seconds. The signature travels as `sha256=<hex>` in
//! [`SIGNATURE_HEADER`], the timestamp in [`TIMESTAMP_HEADER`]. Receivers
//! reject timestamps more than five minutes away from their clock.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::error::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "X-Cellar-Signature";
/// Header carrying the Unix timestamp that was signed.
pub const TIMESTAMP_HEADER: &str = "X-Cellar-Timestamp";
/// Header carrying the event name.
pub const EVENT_HEADER: &str = "X-Cellar-Event";
/// Header carrying the delivery ID, stable across retries.
pub const DELIVERY_HEADER: &str = "X-Cellar-Delivery";

/// Maximum clock distance accepted by [`verify`], in seconds.
pub const MAX_TIMESTAMP_SKEW_SECS: i64 = 300;

const SIGNATURE_PREFIX: &str = "sha256=";

fn mac_for(secret: &SecretString, timestamp: i64, body: &str) -> Result<HmacSha256, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| WebhookError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body.as_bytes());
    Ok(mac)
}

/// Compute the `sha256=<hex>` signature for `body` at `timestamp`.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSignature` if the key cannot be used.
pub fn sign(secret: &SecretString, timestamp: i64, body: &str) -> Result<String, WebhookError> {
    let mac = mac_for(secret, timestamp, body)?;
    Ok(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a received signature.
///
/// `now` is the receiver's current Unix time in seconds. The comparison is
/// constant-time.
///
/// # Errors
///
/// Returns `WebhookError::InvalidSignature` if the timestamp is malformed or
/// outside the allowed skew, or the signature does not match.
pub fn verify(
    secret: &SecretString,
    timestamp: &str,
    body: &str,
    signature: &str,
    now: i64,
) -> Result<(), WebhookError> {
    let ts: i64 = timestamp
        .trim()
        .parse()
        .map_err(|_| WebhookError::InvalidSignature("Invalid timestamp".to_string()))?;

    if (now - ts).abs() > MAX_TIMESTAMP_SKEW_SECS {
        return Err(WebhookError::InvalidSignature(
            "Request timestamp outside allowed window".to_string(),
        ));
    }

    let hex_digest = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or_else(|| WebhookError::InvalidSignature("Missing sha256= prefix".to_string()))?;
    let expected = hex::decode(hex_digest)
        .map_err(|_| WebhookError::InvalidSignature("Signature is not hex".to_string()))?;

    mac_for(secret, ts, body)?
        .verify_slice(&expected)
        .map_err(|_| WebhookError::InvalidSignature("Signature mismatch".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("whsec-7fQ2kLp9Zr4Xv1Bn")
    }

    #[test]
    fn test_signature_format() {
        let signature = sign(&secret(), 1_700_000_000, "{}").unwrap();
        assert!(signature.starts_with("sha256="));
        // 32-byte digest, hex encoded
        assert_eq!(signature.len(), "sha256=".len() + 64);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = sign(&secret(), 1_700_000_000, r#"{"a":1}"#).unwrap();
        let b = sign(&secret(), 1_700_000_000, r#"{"a":1}"#).unwrap();
        assert_eq!(a, b);
        let c = sign(&secret(), 1_700_000_001, r#"{"a":1}"#).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_verify_accepts_valid_signature() {
        let body = r#"{"event":"inventory.low_stock"}"#;
        let signature = sign(&secret(), 1_700_000_000, body).unwrap();
        assert!(verify(&secret(), "1700000000", body, &signature, 1_700_000_100).is_ok());
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let signature = sign(&secret(), 1_700_000_000, "original").unwrap();
        let result = verify(&secret(), "1700000000", "tampered", &signature, 1_700_000_000);
        assert!(matches!(result, Err(WebhookError::InvalidSignature(_))));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let signature = sign(&secret(), 1_700_000_000, "body").unwrap();
        let other = SecretString::from("whsec-different-9Hq3");
        assert!(verify(&other, "1700000000", "body", &signature, 1_700_000_000).is_err());
    }

    #[test]
    fn test_verify_rejects_stale_timestamp() {
        let signature = sign(&secret(), 1_700_000_000, "body").unwrap();
        let result = verify(
            &secret(),
            "1700000000",
            "body",
            &signature,
            1_700_000_000 + MAX_TIMESTAMP_SKEW_SECS + 1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_verify_rejects_malformed_input() {
        assert!(verify(&secret(), "not-a-number", "body", "sha256=00", 0).is_err());
        assert!(verify(&secret(), "0", "body", "md5=00", 0).is_err());
        assert!(verify(&secret(), "0", "body", "sha256=zz", 0).is_err());
    }
}
