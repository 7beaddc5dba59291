//! Blocking client for the Codebase HQ REST API.
//!
//! # Overview
//! `CodebaseApi` validates the account credentials, builds the HTTP Basic
//! authentication header once and exposes one method per remote operation.
//! Each method resolves its endpoint path and delegates to `HttpClient`,
//! which performs a single HTTPS GET and returns the raw `HttpResponse`.
//!
//! # Design
//! - `HttpClient` holds only read-only configuration, so both types can be
//!   shared between threads without locking.
//! - The network round trip sits behind the `Transport` trait. The default
//!   `UreqTransport` opens a fresh connection per call; tests plug in their
//!   own transport to observe or redirect requests.
//! - Response bodies are XML and are passed through untouched.

pub mod api;
pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod http;

pub use api::{CodebaseApi, TicketQuery, BASE_URL};
pub use auth::{BasicAuth, Credentials};
pub use client::{ClientOptions, HttpClient, DEFAULT_TIMEOUT};
pub use endpoint::Endpoint;
pub use error::{ApiError, ClientError, CredentialError, TransportError};
pub use http::{round_trip, HttpRequest, HttpResponse, RequestOptions, Transport, UreqTransport};
