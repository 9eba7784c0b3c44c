//! Normalization of Graph API response bodies.
//!
//! The service answers in one of several shapes: a JSON object (possibly
//! wrapped in a `data` envelope next to `paging`), a JSON object carrying an
//! `error` envelope, a bare `true`/`false`, or text that is not JSON at all.
//! `normalize` folds all of them into a `GraphResponse`.
//!
//! A bare `false` is returned both for "deleted" and for "denied / not
//! found". Nothing in the body tells them apart, so it is passed through as
//! `Boolean(false)` and left to the caller.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{GraphError, Result};

/// A normalized response body.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphResponse {
    Boolean(bool),
    /// Decoded JSON with any `data` envelope already stripped.
    Structured(Value),
    /// The body was not valid JSON.
    Raw(String),
}

impl GraphResponse {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GraphResponse::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            GraphResponse::Structured(value) => Some(value),
            _ => None,
        }
    }

    /// The payload as a JSON object, when it is one.
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.as_structured().and_then(Value::as_object)
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            GraphResponse::Raw(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_false(&self) -> bool {
        matches!(self, GraphResponse::Boolean(false))
    }

    /// Collapse into a JSON value; raw text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            GraphResponse::Boolean(b) => Value::Bool(b),
            GraphResponse::Structured(value) => value,
            GraphResponse::Raw(text) => Value::String(text),
        }
    }
}

/// Normalize a raw response body.
///
/// Fails only when the body is an object carrying an `error` envelope.
pub fn normalize(body: &str) -> Result<GraphResponse> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return Ok(GraphResponse::Raw(body.to_string())),
    };

    match value {
        Value::Bool(b) => Ok(GraphResponse::Boolean(b)),
        Value::Object(mut map) => {
            if let Some(error) = map.remove("error") {
                return Err(api_error(error));
            }
            match map.remove("data") {
                Some(data) => Ok(GraphResponse::Structured(data)),
                None => Ok(GraphResponse::Structured(Value::Object(map))),
            }
        }
        other => Ok(GraphResponse::Structured(other)),
    }
}

fn api_error(error: Value) -> GraphError {
    let message = match (&error, error.get("message")) {
        (Value::String(message), _) => message.clone(),
        (_, Some(Value::String(message))) => message.clone(),
        (_, Some(other)) => other.to_string(),
        (_, None) => error.to_string(),
    };
    let kind = error.get("type").and_then(Value::as_str).map(str::to_string);
    let code = error.get("code").and_then(Value::as_i64);
    warn!(%message, ?kind, ?code, "graph api returned an error envelope");
    GraphError::Api { message, kind, code }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalid_json_is_returned_raw() {
        let response = normalize("plain text").unwrap();
        assert_eq!(response, GraphResponse::Raw("plain text".to_string()));
        assert_eq!(response.as_raw(), Some("plain text"));
    }

    #[test]
    fn empty_body_is_returned_raw() {
        assert_eq!(normalize("").unwrap(), GraphResponse::Raw(String::new()));
    }

    #[test]
    fn booleans_pass_through() {
        assert_eq!(normalize("true").unwrap(), GraphResponse::Boolean(true));
        let response = normalize("false").unwrap();
        assert!(response.is_false());
        assert_eq!(response.as_bool(), Some(false));
    }

    #[test]
    fn data_envelope_is_stripped() {
        let response = normalize(r#"{"data": [1, 2, 3], "paging": {"next": "x"}}"#).unwrap();
        assert_eq!(response, GraphResponse::Structured(json!([1, 2, 3])));
    }

    #[test]
    fn object_without_data_is_kept() {
        let response = normalize(r#"{"id": "4", "name": "Mark"}"#).unwrap();
        let object = response.as_object().unwrap();
        assert_eq!(object["id"], "4");
        assert_eq!(object["name"], "Mark");
    }

    #[test]
    fn error_envelope_raises_with_message() {
        let err = normalize(r#"{"error": {"message": "bad token"}}"#).unwrap_err();
        assert_eq!(err.to_string(), "bad token");
        assert!(matches!(err, GraphError::Api { kind: None, code: None, .. }));
    }

    #[test]
    fn error_envelope_keeps_type_and_code() {
        let body = r#"{"error": {"message": "Invalid OAuth access token.", "type": "OAuthException", "code": 190}}"#;
        match normalize(body).unwrap_err() {
            GraphError::Api { message, kind, code } => {
                assert_eq!(message, "Invalid OAuth access token.");
                assert_eq!(kind.as_deref(), Some("OAuthException"));
                assert_eq!(code, Some(190));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn bare_string_error_is_unquoted() {
        let err = normalize(r#"{"error": "invalid_request"}"#).unwrap_err();
        assert_eq!(err.to_string(), "invalid_request");
    }

    #[test]
    fn error_takes_precedence_over_data() {
        let err = normalize(r#"{"data": [], "error": {"message": "nope"}}"#).unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn non_object_json_is_structured() {
        assert_eq!(normalize("[1, 2]").unwrap(), GraphResponse::Structured(json!([1, 2])));
        assert_eq!(normalize("null").unwrap(), GraphResponse::Structured(Value::Null));
    }

    #[test]
    fn into_value_collapses_variants() {
        assert_eq!(GraphResponse::Boolean(true).into_value(), json!(true));
        assert_eq!(GraphResponse::Raw("x".to_string()).into_value(), json!("x"));
    }
}
