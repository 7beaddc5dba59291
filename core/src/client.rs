//! Blocking HTTPS client that speaks to a single host.
//!
//! # Design
//! `HttpClient` keeps only read-only configuration: the target host, the
//! precomputed `Authorization` value and the default timeout. Every `get`
//! resolves an `HttpRequest` with `build_get` and hands it to the
//! `Transport`, which opens and closes its own connection. Nothing is mutated
//! after construction, so a shared reference can be used from any number of
//! threads.

use std::fmt;
use std::time::Duration;

use tracing::debug;
use url::form_urlencoded;
use url::Url;

use crate::auth::BasicAuth;
use crate::error::ClientError;
use crate::http::{HttpRequest, HttpResponse, RequestOptions, Transport, UreqTransport, HTTPS_PORT};

/// Timeout applied when neither the client nor the call sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const AUTHORIZATION: &str = "Authorization";

/// Construction options for `HttpClient`.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// When set, every request carries `Authorization: Basic ...`.
    pub auth: Option<BasicAuth>,
    /// Client-wide timeout; `DEFAULT_TIMEOUT` when `None`.
    pub timeout: Option<Duration>,
}

#[derive(Clone)]
pub struct HttpClient<T = UreqTransport> {
    host: String,
    auth_header: Option<String>,
    timeout: Duration,
    transport: T,
}

impl HttpClient<UreqTransport> {
    /// Build a client for the host of `base_url` using the default HTTPS
    /// transport. Scheme, port and path of `base_url` are ignored.
    pub fn new(base_url: &str, options: ClientOptions) -> Result<Self, ClientError> {
        Self::with_transport(base_url, options, UreqTransport)
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_transport(base_url: &str, options: ClientOptions, transport: T) -> Result<Self, ClientError> {
        Ok(Self {
            host: host_of(base_url)?,
            auth_header: options.auth.as_ref().map(BasicAuth::header_value),
            timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
            transport,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Client-wide default timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve the request `get` would send, without sending it.
    ///
    /// Caller headers keep their order. The Basic-Auth header is appended
    /// unless the caller already set `Authorization`, in which case the
    /// caller's value is used as-is.
    pub fn build_get(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpRequest, ClientError> {
        if endpoint.is_empty() {
            return Err(ClientError::EmptyEndpoint);
        }

        let mut headers = options.headers.clone();
        if let Some(auth) = &self.auth_header {
            let caller_has_auth = headers.iter().any(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION));
            if !caller_has_auth {
                headers.push((AUTHORIZATION.to_string(), auth.clone()));
            }
        }

        Ok(HttpRequest {
            host: self.host.clone(),
            port: HTTPS_PORT,
            path: with_query(endpoint, &options.params),
            headers,
            timeout: options.timeout.unwrap_or(self.timeout),
        })
    }

    /// Send a GET for `endpoint` and return the response untouched.
    ///
    /// Status codes are not inspected; only failures to complete the round
    /// trip are errors.
    pub fn get(&self, endpoint: &str, options: &RequestOptions) -> Result<HttpResponse, ClientError> {
        let request = self.build_get(endpoint, options)?;
        debug!(
            host = %request.host,
            path = %request.path,
            timeout_secs = request.timeout.as_secs(),
            "sending GET"
        );
        let response = self.transport.send(&request)?;
        debug!(status = response.status, bytes = response.body.len(), "received response");
        Ok(response)
    }
}

impl<T: fmt::Debug> fmt::Debug for HttpClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("host", &self.host)
            .field("auth_header", &self.auth_header.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("transport", &self.transport)
            .finish()
    }
}

fn host_of(base_url: &str) -> Result<String, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };
    let url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .ok_or_else(|| invalid("missing host".to_string()))
}

/// Append `params` form-encoded; `endpoint` is returned verbatim when there
/// are none.
fn with_query(endpoint: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return endpoint.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{query}")
}
