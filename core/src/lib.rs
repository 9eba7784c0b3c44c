//! Synchronous client binding for the Graph API.
//!
//! # Overview
//! `GraphApi` formats requests, attaches the access token, and folds the
//! service's irregular response bodies into a `GraphResponse`: a boolean,
//! structured JSON with the `data` envelope stripped, or raw text.
//!
//! # Design
//! - `GraphApi` holds only a token, a base URL and a `Transport`.
//! - Request construction (`build_request`) and normalization
//!   (`parse_response`, `response::normalize`) are pure and testable
//!   without a network; `Transport` performs the I/O in between.
//! - `false` bodies are ambiguous on the wire and stay ambiguous here; the
//!   verb methods turn them into `GraphError::Api`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod response;
pub mod search;
pub mod signed_request;
pub mod transport;
pub mod types;

pub use client::{GraphApi, GraphApiBuilder};
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::{GraphError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::{normalize, GraphResponse};
pub use search::SearchType;
pub use signed_request::{parse_signed_request, sign_payload, SignedRequestError};
pub use transport::{Transport, UreqTransport};
pub use types::{ParamValue, Params};
