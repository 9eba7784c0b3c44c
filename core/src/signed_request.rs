//! Signed requests: the `signed_request` blob the platform POSTs to canvas
//! and page-tab apps.
//!
//! Format: `base64url(signature) "." base64url(payload)`, where the payload is
//! a JSON object and the signature is HMAC-SHA256 of the *encoded* payload
//! keyed with the application secret. The signature is checked against the
//! payload exactly as transmitted; padding is only tolerated when decoding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HMAC-SHA256";

#[derive(Debug, Error)]
pub enum SignedRequestError {
    #[error("expected `<signature>.<payload>`")]
    Malformed,

    #[error("bad base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("payload is not a JSON object: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(Option<String>),

    #[error("signature mismatch")]
    SignatureMismatch,
}

/// Verify `signed_request` against `app_secret` and return its payload.
pub fn parse_signed_request(
    signed_request: &str,
    app_secret: &str,
) -> Result<Map<String, Value>, SignedRequestError> {
    let (encoded_signature, encoded_payload) = signed_request
        .split_once('.')
        .ok_or(SignedRequestError::Malformed)?;

    let signature = decode(encoded_signature)?;
    let payload: Map<String, Value> = serde_json::from_slice(&decode(encoded_payload)?)?;

    let algorithm = payload.get("algorithm").and_then(Value::as_str);
    if !algorithm.is_some_and(|alg| alg.eq_ignore_ascii_case(ALGORITHM)) {
        return Err(SignedRequestError::UnsupportedAlgorithm(algorithm.map(str::to_string)));
    }

    let mut mac = mac(app_secret);
    mac.update(encoded_payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| SignedRequestError::SignatureMismatch)?;

    Ok(payload)
}

/// Encode and sign `payload`, adding `"algorithm": "HMAC-SHA256"`.
///
/// The inverse of `parse_signed_request`; useful for tests and for apps that
/// hand signed state to their own front end.
pub fn sign_payload(payload: &Map<String, Value>, app_secret: &str) -> String {
    let mut payload = payload.clone();
    payload.insert("algorithm".to_string(), Value::String(ALGORITHM.to_string()));

    let encoded_payload = URL_SAFE_NO_PAD.encode(Value::Object(payload).to_string());
    let mut mac = mac(app_secret);
    mac.update(encoded_payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    format!("{signature}.{encoded_payload}")
}

/// The `oauth_token` carried by a parsed payload, if any.
pub fn oauth_token(payload: &Map<String, Value>) -> Option<String> {
    payload
        .get("oauth_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn decode(part: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(part.trim_end_matches('='))
}

fn mac(app_secret: &str) -> HmacSha256 {
    <HmacSha256 as Mac>::new_from_slice(app_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "app-secret";

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn sign_then_parse_recovers_payload() {
        let signed = sign_payload(&payload(json!({"user_id": "42", "oauth_token": "tok"})), SECRET);
        let parsed = parse_signed_request(&signed, SECRET).unwrap();
        assert_eq!(parsed["user_id"], "42");
        assert_eq!(parsed["algorithm"], "HMAC-SHA256");
        assert_eq!(oauth_token(&parsed).as_deref(), Some("tok"));
    }

    #[test]
    fn padded_signature_is_accepted() {
        let signed = sign_payload(&payload(json!({"a": 1})), SECRET);
        let (sig, body) = signed.split_once('.').unwrap();
        let padded = format!("{sig}=.{body}");
        assert!(parse_signed_request(&padded, SECRET).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let signed = sign_payload(&payload(json!({"oauth_token": "tok"})), SECRET);
        let err = parse_signed_request(&signed, "other-secret").unwrap_err();
        assert!(matches!(err, SignedRequestError::SignatureMismatch));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let signed = sign_payload(&payload(json!({"oauth_token": "tok"})), SECRET);
        let (sig, _) = signed.split_once('.').unwrap();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"algorithm":"HMAC-SHA256","oauth_token":"evil"}"#);
        let err = parse_signed_request(&format!("{sig}.{forged}"), SECRET).unwrap_err();
        assert!(matches!(err, SignedRequestError::SignatureMismatch));
    }

    #[test]
    fn missing_separator_is_malformed() {
        let err = parse_signed_request("no-dot-here", SECRET).unwrap_err();
        assert!(matches!(err, SignedRequestError::Malformed));
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let body = URL_SAFE_NO_PAD.encode(r#"{"algorithm":"RSA","oauth_token":"tok"}"#);
        let err = parse_signed_request(&format!("c2ln.{body}"), SECRET).unwrap_err();
        assert!(matches!(err, SignedRequestError::UnsupportedAlgorithm(Some(alg)) if alg == "RSA"));
    }

    #[test]
    fn non_json_payload_is_rejected() {
        let body = URL_SAFE_NO_PAD.encode("not json");
        let err = parse_signed_request(&format!("c2ln.{body}"), SECRET).unwrap_err();
        assert!(matches!(err, SignedRequestError::Payload(_)));
    }

    #[test]
    fn empty_token_counts_as_absent() {
        assert!(oauth_token(&payload(json!({"oauth_token": ""}))).is_none());
        assert!(oauth_token(&payload(json!({"user_id": "1"}))).is_none());
    }
}
