//! HTTP transport types and the default HTTPS transport.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe a round trip as plain data.
//! `HttpClient` resolves everything that can be decided without the network
//! (target host, merged headers, encoded query, timeout) into an
//! `HttpRequest`, then hands it to a `Transport`. The transport owns the
//! actual I/O, which keeps request resolution deterministic and lets tests
//! observe the exact request while pointing the bytes somewhere else.
//!
//! All fields use owned types (`String`, `Vec`) so values can be stored and
//! compared freely in tests.

use std::borrow::Cow;
use std::time::Duration;

use tracing::warn;

use crate::error::TransportError;

/// Port every request is sent to.
pub const HTTPS_PORT: u16 = 443;

/// A fully resolved HTTPS GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub host: String,
    pub port: u16,
    /// Endpoint path including the encoded query string, if any.
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Absolute URL this request targets.
    pub fn url(&self) -> String {
        format!("https://{}:{}{}", self.host, self.port, self.path)
    }

    /// First header value whose name matches `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Per-call knobs for `HttpClient::get`. The default sends no extra headers,
/// no query string and uses the client's timeout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub params: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Performs one request/response round trip.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// Blocking HTTPS transport backed by `ureq`.
///
/// A new agent is built for every call, so each request opens its own
/// connection and the connection is dropped with the agent on every exit
/// path.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        round_trip(&request.url(), request)
    }
}

/// Send `request` to `url` on a single-use agent and return the raw response.
///
/// Redirects are not followed and the body is read in full with no size
/// limit. `ureq` is built without its decompression features, so no
/// `Accept-Encoding` is added and the body bytes are exactly what the server
/// sent.
pub fn round_trip(url: &str, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
    let agent = single_use_agent(request.timeout);

    let mut builder = agent.get(url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder.call().map_err(|e| transport_error(request, e))?;
    into_response(response).map_err(|e| transport_error(request, e))
}

fn single_use_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .max_redirects(0)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

fn into_response(mut response: ureq::http::Response<ureq::Body>) -> Result<HttpResponse, ureq::Error> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_vec()?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn transport_error(request: &HttpRequest, err: ureq::Error) -> TransportError {
    warn!(host = %request.host, path = %request.path, error = %err, "transport failure");
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout {
            host: request.host.clone(),
            timeout: request.timeout,
        },
        other => TransportError::Failed {
            host: request.host.clone(),
            source: Box::new(other),
        },
    }
}
