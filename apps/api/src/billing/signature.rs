//! Stripe webhook signature verification.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=...][,v0=...]`.
//! Signed payload: `"{t}.{raw body}"`, HMAC-SHA256 keyed with the endpoint secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed clock skew between Stripe's timestamp and ours.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("Missing stripe-signature header")]
    MissingHeader,

    #[error("Malformed stripe-signature header")]
    Malformed,

    #[error("Timestamp outside tolerance window")]
    Expired,

    #[error("No matching v1 signature")]
    Mismatch,
}

struct ParsedHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=').ok_or(SignatureError::Malformed)?;
        match key {
            "t" => timestamp = Some(value.parse::<i64>().map_err(|_| SignatureError::Malformed)?),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if signatures.is_empty() {
        return Err(SignatureError::Mismatch);
    }
    Ok(ParsedHeader {
        timestamp,
        signatures,
    })
}

/// Verifies `payload` against the `stripe-signature` header value.
pub fn verify_signature(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<(), SignatureError> {
    let header = header.ok_or(SignatureError::MissingHeader)?;
    let parsed = parse_header(header)?;

    if now_unix.abs_diff(parsed.timestamp) > tolerance_secs.unsigned_abs() {
        return Err(SignatureError::Expired);
    }

    for candidate in parsed.signatures {
        let Ok(expected) = hex::decode(candidate) else {
            continue;
        };
        // Constant-time comparison inside `verify_slice`.
        if signed_mac(secret, parsed.timestamp, payload)
            .verify_slice(&expected)
            .is_ok()
        {
            return Ok(());
        }
    }

    Err(SignatureError::Mismatch)
}

fn signed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Builds a valid header for `payload`. Used by tests and local tooling.
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signature = hex::encode(signed_mac(secret, timestamp, payload).finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"customer.subscription.updated"}"#;
    const NOW: i64 = 1_700_000_000;

    #[test]
    fn test_valid_signature() {
        let header = sign_payload(BODY, SECRET, NOW);
        assert_eq!(
            verify_signature(BODY, Some(&header), SECRET, NOW + 10, DEFAULT_TOLERANCE_SECS),
            Ok(())
        );
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            verify_signature(BODY, None, SECRET, NOW, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::MissingHeader)
        );
    }

    #[test]
    fn test_tampered_body() {
        let header = sign_payload(BODY, SECRET, NOW);
        assert_eq!(
            verify_signature(b"{}", Some(&header), SECRET, NOW, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_wrong_secret() {
        let header = sign_payload(BODY, "whsec_other", NOW);
        assert_eq!(
            verify_signature(BODY, Some(&header), SECRET, NOW, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn test_expired_timestamp() {
        let header = sign_payload(BODY, SECRET, NOW);
        assert_eq!(
            verify_signature(BODY, Some(&header), SECRET, NOW + 301, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Expired)
        );
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            verify_signature(BODY, Some("garbage"), SECRET, NOW, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            verify_signature(BODY, Some("v1=abc"), SECRET, NOW, DEFAULT_TOLERANCE_SECS),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn test_any_v1_may_match() {
        let valid = sign_payload(BODY, SECRET, NOW);
        let v1 = valid.split_once(",v1=").unwrap().1;
        let header = format!("t={NOW},v1=deadbeef,v0=ignored,v1={v1}");
        assert!(verify_signature(BODY, Some(&header), SECRET, NOW, DEFAULT_TOLERANCE_SECS).is_ok());
    }

    #[test]
    fn test_extreme_timestamps_are_expired() {
        for t in [i64::MIN, i64::MAX] {
            let header = format!("t={t},v1=00");
            assert_eq!(
                verify_signature(b"{}", Some(&header), SECRET, NOW, DEFAULT_TOLERANCE_SECS),
                Err(SignatureError::Expired)
            );
        }
    }
}
