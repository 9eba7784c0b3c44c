//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe Graph API requests and responses as plain data.
//! `GraphApi::build_request` produces an `HttpRequest` and
//! `GraphApi::parse_response` consumes an `HttpResponse`; executing the
//! round-trip is the job of a `Transport`. Keeping the two halves as data
//! lets request construction and normalization be tested without a network.

use std::fmt;

/// HTTP method for a request. The Graph API only needs three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and, for GET and DELETE, already carries every
/// parameter in its query string. POST requests carry their parameters as a
/// form-encoded `body` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Decoded query-string pairs of `url`, in order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match url::Url::parse(&self.url) {
            Ok(url) => url.query_pairs().into_owned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Decoded form pairs of the body, empty when there is no body.
    pub fn form_pairs(&self) -> Vec<(String, String)> {
        self.body
            .as_deref()
            .map(|body| url::form_urlencoded::parse(body.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }
}

/// An HTTP response described as plain data.
///
/// The status is kept for logging only; the Graph API signals failures in
/// the body, which is all normalization looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}
