//! Error types for the Codebase HQ client.
//!
//! # Design
//! Credential problems can only happen while the façade is being built, so
//! they get their own type and never show up on a request path. Everything a
//! request can run into lands in `ClientError`; network-level failures are
//! wrapped unchanged in `TransportError` so callers can tell a timeout from a
//! refused connection. Non-2xx statuses are not errors at all: they come back
//! as an ordinary `HttpResponse`.

use std::time::Duration;

use thiserror::Error;

/// One of the three façade constructor arguments was empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "One or more CodeBaseAPI class constructor parameter is empty (`{field}`).\n\
     Syntax is CodebaseApi::new(account_name, username, api_key)"
)]
pub struct CredentialError {
    /// Name of the first empty argument.
    pub field: &'static str,
}

/// A single round trip could not be completed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {host} timed out after {timeout:?}")]
    Timeout { host: String, timeout: Duration },

    /// Connection, DNS, TLS or protocol failure.
    #[error("request to {host} failed: {source}")]
    Failed {
        host: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors returned by `HttpClient`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL did not parse or carries no host.
    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("endpoint must not be empty")]
    EmptyEndpoint,

    #[error("project permalink must not be empty")]
    EmptyPermalink,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Errors returned by `CodebaseApi`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Client(#[from] ClientError),
}
