//! In-memory stand-in for the Codebase HQ API.
//!
//! Serves a fixed set of projects and tickets as XML and enforces HTTP Basic
//! authentication against one configured identity and API key.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::debug;

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(3);

/// Size of the `/large` body, above ureq's default 10 MiB read limit.
pub const LARGE_BODY_LEN: usize = 11 * 1024 * 1024;

/// Body of `/gzipped`: a gzip header followed by bytes that do not inflate,
/// so any client-side decoding is visible.
pub const GZIP_BODY: &[u8] = &[0x1f, 0x8b, 0x08, 0x00, 0xde, 0xad, 0xbe, 0xef];

#[derive(Clone, Debug)]
pub struct Project {
    pub name: String,
    pub account_name: String,
    pub permalink: String,
    pub status: String,
    pub open_tickets: u32,
    pub closed_tickets: u32,
}

impl Project {
    fn to_xml(&self) -> String {
        format!(
            "<project>\
             <group-id type=\"integer\" nil=\"true\"/>\
             <icon type=\"integer\">1</icon>\
             <name>{}</name>\
             <account-name>{}</account-name>\
             <permalink>{}</permalink>\
             <start-page>overview</start-page>\
             <status>{}</status>\
             <total-tickets>{}</total-tickets>\
             <open-tickets>{}</open-tickets>\
             <closed-tickets>{}</closed-tickets>\
             </project>",
            self.name,
            self.account_name,
            self.permalink,
            self.status,
            self.open_tickets + self.closed_tickets,
            self.open_tickets,
            self.closed_tickets,
        )
    }
}

#[derive(Clone, Debug)]
pub struct Ticket {
    pub project: String,
    pub id: u32,
    pub summary: String,
    pub status: String,
}

impl Ticket {
    fn to_xml(&self) -> String {
        format!(
            "<ticket>\
             <ticket-id type=\"integer\">{}</ticket-id>\
             <summary>{}</summary>\
             <status>{}</status>\
             </ticket>",
            self.id, self.summary, self.status,
        )
    }
}

/// Credentials and fixtures shared by every handler.
#[derive(Clone, Debug)]
pub struct MockState {
    expected_auth: String,
    projects: Arc<Vec<Project>>,
    tickets: Arc<Vec<Ticket>>,
}

impl MockState {
    /// `identity` is `account/username`; requests must authenticate as
    /// `identity:api_key`.
    pub fn new(identity: &str, api_key: &str) -> Self {
        Self {
            expected_auth: format!("{identity}:{api_key}"),
            projects: Arc::new(fixture_projects()),
            tickets: Arc::new(fixture_tickets()),
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let decoded = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Basic "))
            .and_then(|encoded| STANDARD.decode(encoded).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok());

        match decoded {
            Some(credentials) if credentials == self.expected_auth => Ok(()),
            _ => {
                debug!("rejecting request with missing or wrong credentials");
                Err((
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Basic realm=\"Application\"")],
                    "HTTP Basic: Access denied.\n",
                )
                    .into_response())
            }
        }
    }
}

#[derive(Deserialize)]
pub struct TicketParams {
    pub query: Option<String>,
    pub page: Option<u32>,
}

pub fn app(state: MockState) -> Router {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/slow", get(slow))
        .route("/moved", get(moved))
        .route("/large", get(large))
        .route("/gzipped", get(gzipped))
        .route("/{permalink}", get(get_project))
        .route("/{permalink}/tickets", get(list_tickets))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn xml(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body).into_response()
}

async fn list_projects(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    let items: String = state.projects.iter().map(Project::to_xml).collect();
    xml(StatusCode::OK, format!("<projects type=\"array\">{items}</projects>"))
}

async fn get_project(
    State(state): State<MockState>,
    Path(permalink): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    match state.projects.iter().find(|p| p.permalink == permalink) {
        Some(project) => xml(StatusCode::OK, project.to_xml()),
        None => xml(StatusCode::NOT_FOUND, "<error>Record not found</error>".to_string()),
    }
}

async fn list_tickets(
    State(state): State<MockState>,
    Path(permalink): Path<String>,
    Query(params): Query<TicketParams>,
    headers: HeaderMap,
) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    if !state.projects.iter().any(|p| p.permalink == permalink) {
        return xml(StatusCode::NOT_FOUND, "<error>Record not found</error>".to_string());
    }

    // Only the first page has results and only `status:<name>` is understood.
    let wanted_status = params
        .query
        .as_deref()
        .and_then(|q| q.split_whitespace().find_map(|term| term.strip_prefix("status:")));
    let items: String = if params.page.unwrap_or(1) > 1 {
        String::new()
    } else {
        state
            .tickets
            .iter()
            .filter(|t| t.project == permalink)
            .filter(|t| wanted_status.map_or(true, |s| t.status == s))
            .map(Ticket::to_xml)
            .collect()
    };
    xml(StatusCode::OK, format!("<tickets type=\"array\">{items}</tickets>"))
}

async fn slow(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    tokio::time::sleep(SLOW_DELAY).await;
    xml(StatusCode::OK, "<ok/>".to_string())
}

/// Points at `/projects`; clients that follow it never see the 307.
async fn moved(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    Redirect::temporary("/projects").into_response()
}

async fn large(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    (StatusCode::OK, vec![b'x'; LARGE_BODY_LEN]).into_response()
}

/// Echoes the request's `Accept-Encoding` in `x-accept-encoding`, or `none`.
async fn gzipped(State(state): State<MockState>, headers: HeaderMap) -> Response {
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    let accept = headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("none")
        .to_string();
    (
        StatusCode::OK,
        [
            (header::CONTENT_ENCODING, "gzip".to_string()),
            (header::HeaderName::from_static("x-accept-encoding"), accept),
        ],
        GZIP_BODY,
    )
        .into_response()
}

fn fixture_projects() -> Vec<Project> {
    vec![
        Project {
            name: "Codebase".to_string(),
            account_name: "aTech Media".to_string(),
            permalink: "codebase".to_string(),
            status: "active".to_string(),
            open_tickets: 2,
            closed_tickets: 1,
        },
        Project {
            name: "Deploy".to_string(),
            account_name: "aTech Media".to_string(),
            permalink: "deploy".to_string(),
            status: "archived".to_string(),
            open_tickets: 0,
            closed_tickets: 0,
        },
    ]
}

fn fixture_tickets() -> Vec<Ticket> {
    let ticket = |id, summary: &str, status: &str| Ticket {
        project: "codebase".to_string(),
        id,
        summary: summary.to_string(),
        status: status.to_string(),
    };
    vec![
        ticket(1, "Login page times out", "open"),
        ticket(2, "Add SSH key rotation", "open"),
        ticket(3, "Typo in footer", "closed"),
    ]
}
