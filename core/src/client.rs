//! The Graph API client.
//!
//! # Design
//! `GraphApi` holds an optional token, a base URL and a transport, and
//! carries no mutable state between calls. Every verb goes through the same
//! two steps: `build_request` turns a path and `Params` into an
//! `HttpRequest`, and `parse_response` normalizes the `HttpResponse` the
//! transport hands back. Both are public so the host can drive the
//! round-trip itself.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{GraphError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::response::{normalize, GraphResponse};
use crate::search::SearchType;
use crate::signed_request::{oauth_token, parse_signed_request};
use crate::transport::{Transport, UreqTransport};
use crate::types::{ParamValue, Params};

const ACCESS_TOKEN: &str = "access_token";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous client for the Graph API.
pub struct GraphApi<T = UreqTransport> {
    oauth_token: Option<String>,
    base_url: String,
    transport: T,
}

impl GraphApi<UreqTransport> {
    /// A client against the production endpoint. `None` (or an empty
    /// token) makes unauthenticated requests.
    pub fn new(oauth_token: Option<String>) -> Self {
        let config = ClientConfig::default();
        let transport = UreqTransport::new(&config);
        Self::with_transport(oauth_token, &config, transport)
    }

    pub fn builder() -> GraphApiBuilder {
        GraphApiBuilder::default()
    }
}

impl<T: Transport> GraphApi<T> {
    pub fn with_transport(oauth_token: Option<String>, config: &ClientConfig, transport: T) -> Self {
        Self {
            oauth_token: oauth_token.filter(|token| !token.is_empty()),
            base_url: config.normalized_base_url(),
            transport,
        }
    }

    pub fn oauth_token(&self) -> Option<&str> {
        self.oauth_token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch an object or connection, e.g. `get("me/friends", params)`.
    ///
    /// A bare `false` body is reported as `GraphError::Api`.
    pub fn get(&self, path: &str, options: Params) -> Result<GraphResponse> {
        let response = self.query(HttpMethod::Get, path, options)?;
        if response.is_false() {
            return Err(GraphError::api(format!("Could not get \"{path}\".")));
        }
        Ok(response)
    }

    /// Publish to a connection, e.g. `post("me/feed", message)`.
    pub fn post(&self, path: &str, data: Params) -> Result<GraphResponse> {
        let response = self.query(HttpMethod::Post, path, data)?;
        if response.is_false() {
            return Err(GraphError::api(format!("Could not post to \"{path}\".")));
        }
        Ok(response)
    }

    /// Delete an object.
    ///
    /// The service answers `false` both when the object is gone and when
    /// access is denied; either way this returns `GraphError::Api`.
    pub fn delete(&self, path: &str) -> Result<GraphResponse> {
        let response = self.query(HttpMethod::Delete, path, Params::new())?;
        if response.is_false() {
            return Err(GraphError::api(format!("Could not delete \"{path}\".")));
        }
        Ok(response)
    }

    /// Search for objects of type `kind` matching `term`.
    ///
    /// `kind` must name a `SearchType`; anything else fails before a
    /// request is built. Entries in `options` override `q` and `type`.
    pub fn search(&self, term: &str, kind: &str, options: Params) -> Result<GraphResponse> {
        let kind: SearchType = kind.parse()?;

        let mut params = Params::new().with("q", term).with("type", kind.as_str());
        params.merge(options);

        self.query(HttpMethod::Get, "search", params)
    }

    /// One round-trip: build, execute, normalize. No `false` check.
    pub fn query(&self, method: HttpMethod, path: &str, params: Params) -> Result<GraphResponse> {
        let request = self.build_request(method, path, params)?;
        debug!(%method, path = path_for_log(path), "graph api request");
        let response = self.transport.execute(&request)?;
        self.parse_response(response)
    }

    /// Build the request for `method` on `path`.
    ///
    /// The token is merged into `params` last, so it overrides a caller
    /// supplied `access_token`. GET and DELETE carry everything in the query
    /// string, merged over whatever query `path` already has; POST carries
    /// everything in a form body and uses the URL as given.
    pub fn build_request(&self, method: HttpMethod, path: &str, mut params: Params) -> Result<HttpRequest> {
        if let Some(token) = &self.oauth_token {
            params.insert(ACCESS_TOKEN, token.as_str());
        }

        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;

        match method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut query = existing_query(&url);
                query.merge(params);

                let pairs = query.to_pairs();
                if pairs.is_empty() {
                    url.set_query(None);
                } else {
                    url.query_pairs_mut().clear().extend_pairs(pairs);
                }

                Ok(HttpRequest {
                    method,
                    url: url.into(),
                    headers: Vec::new(),
                    body: None,
                })
            }
            HttpMethod::Post => {
                let (headers, body) = if params.is_empty() {
                    (Vec::new(), None)
                } else {
                    let body = url::form_urlencoded::Serializer::new(String::new())
                        .extend_pairs(params.to_pairs())
                        .finish();
                    (
                        vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
                        Some(body),
                    )
                };

                Ok(HttpRequest {
                    method,
                    url: url.into(),
                    headers,
                    body,
                })
            }
        }
    }

    /// Normalize a response body. The status code is not consulted.
    pub fn parse_response(&self, response: HttpResponse) -> Result<GraphResponse> {
        normalize(&response.body)
    }
}

impl<T> fmt::Debug for GraphApi<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphApi")
            .field("oauth_token", &self.oauth_token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// `path` without its query string, which may carry a token.
fn path_for_log(path: &str) -> &str {
    path.split_once('?').map_or(path, |(path, _)| path)
}

/// Query parameters already present on `url`. A key that repeats is
/// collapsed to a list, which goes back on the wire comma-joined.
fn existing_query(url: &Url) -> Params {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in url.query_pairs() {
        grouped.entry(key.into_owned()).or_default().push(value.into_owned());
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                ParamValue::Text(values.remove(0))
            } else {
                ParamValue::List(values)
            };
            (key, value)
        })
        .collect()
}

/// Builds a `GraphApi` from an explicit token or from a signed request.
#[derive(Debug, Default)]
pub struct GraphApiBuilder {
    oauth_token: Option<String>,
    signed_request: Option<String>,
    app_secret: Option<String>,
    config: ClientConfig,
}

impl GraphApiBuilder {
    pub fn oauth_token(mut self, token: impl Into<String>) -> Self {
        self.oauth_token = Some(token.into());
        self
    }

    /// Extract the token from `signed_request`, verified with `app_secret`.
    /// Ignored when an explicit token is also given.
    pub fn signed_request(mut self, signed_request: impl Into<String>, app_secret: impl Into<String>) -> Self {
        self.signed_request = Some(signed_request.into());
        self.app_secret = Some(app_secret.into());
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<GraphApi<UreqTransport>> {
        let transport = UreqTransport::new(&self.config);
        self.build_with_transport(transport)
    }

    pub fn build_with_transport<T: Transport>(self, transport: T) -> Result<GraphApi<T>> {
        let token = self.resolve_token()?;
        Ok(GraphApi::with_transport(token, &self.config, transport))
    }

    fn resolve_token(&self) -> Result<Option<String>> {
        let explicit = self.oauth_token.as_deref().filter(|token| !token.is_empty());
        if let Some(token) = explicit {
            return Ok(Some(token.to_string()));
        }

        match (self.signed_request.as_deref(), self.app_secret.as_deref()) {
            (Some(signed_request), Some(app_secret)) if !signed_request.is_empty() && !app_secret.is_empty() => {
                let payload = parse_signed_request(signed_request, app_secret)?;
                let token = oauth_token(&payload);
                debug!(authenticated = token.is_some(), "token taken from signed request");
                Ok(token)
            }
            _ => Ok(None),
        }
    }
}
