//! Executing `HttpRequest`s.
//!
//! `GraphApi` never touches the network itself; it hands each built request
//! to a `Transport`. `UreqTransport` is the blocking default. Tests swap in
//! a closure that records the request and returns a canned response.

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{GraphError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP round-trip.
///
/// Implementations must return non-2xx responses as data, not as errors:
/// the Graph API reports failures in the body. Only failures that leave no
/// body to read belong in `GraphError::Transport`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse>,
{
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            (HttpMethod::Delete, _) => {
                let mut builder = self.agent.delete(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            (HttpMethod::Post, body) => {
                let mut builder = self.agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| GraphError::Transport(Box::new(e)))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| GraphError::Transport(Box::new(e)))?;
        let body = body_text(bytes);

        debug!(status, bytes = body.len(), "graph api responded");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Bodies that are not UTF-8 (images behind `picture` redirects) are kept
/// lossily so they still normalize to `GraphResponse::Raw`.
fn body_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn closures_are_transports() {
        let transport =
            |req: &HttpRequest| -> Result<HttpResponse> { Ok(HttpResponse::ok(req.url.clone())) };
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/me".to_string(),
            headers: Vec::new(),
            body: None,
        };
        assert_eq!(transport.execute(&req).unwrap().body, "http://localhost/me");
    }

    #[test]
    fn binary_body_is_kept_lossily() {
        let body = body_text(vec![0xff, 0xd8, 0xff, 0xe0, b'J', b'F', b'I', b'F']);
        assert!(body.ends_with("JFIF"));
        assert!(body.starts_with('\u{FFFD}'));
        assert_eq!(body_text(b"plain".to_vec()), "plain");
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let config = ClientConfig {
            base_url: "http://127.0.0.1:1/".to_string(),
            timeout: Some(Duration::from_secs(2)),
        };
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:1/me".to_string(),
            headers: Vec::new(),
            body: None,
        };
        let err = UreqTransport::new(&config).execute(&req).unwrap_err();
        assert!(matches!(err, GraphError::Transport(_)));
    }
}
