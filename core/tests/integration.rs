//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `CodebaseApi` through
//! a loopback `Transport` that records the request the client resolved (host
//! `api3.codebasehq.com`, port 443) and replays it over plain HTTP to the mock
//! server through the same `round_trip` the HTTPS transport uses.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine};
use codebase_core::{
    round_trip, BasicAuth, ClientError, ClientOptions, CodebaseApi, HttpClient, HttpRequest, HttpResponse,
    RequestOptions, TicketQuery, Transport, TransportError, BASE_URL,
};
use mock_server::{MockState, GZIP_BODY, LARGE_BODY_LEN};

const ACCOUNT: &str = "aTech";
const USERNAME: &str = "alice";
const API_KEY: &str = "key123";

/// Forwards every request to the mock server and keeps a copy of it.
struct Loopback {
    addr: SocketAddr,
    seen: Mutex<Vec<HttpRequest>>,
}

impl Loopback {
    fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn seen(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for Loopback {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        round_trip(&format!("http://{}{}", self.addr, request.path), request)
    }
}

/// Start the mock server on a random port and return its address.
fn start_mock() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let state = MockState::new(&format!("{ACCOUNT}/{USERNAME}"), API_KEY);
            mock_server::run(listener, state).await
        })
        .unwrap();
    });

    addr
}

/// Fetch `path` from the mock server directly, bypassing the client.
fn fetch_direct(addr: SocketAddr, path: &str) -> Vec<u8> {
    let token = STANDARD.encode(format!("{ACCOUNT}/{USERNAME}:{API_KEY}"));
    ureq::get(format!("http://{addr}{path}"))
        .header("Authorization", format!("Basic {token}"))
        .call()
        .unwrap()
        .body_mut()
        .read_to_vec()
        .unwrap()
}

#[test]
fn get_all_projects_end_to_end() {
    let addr = start_mock();
    let api = CodebaseApi::with_transport(ACCOUNT, USERNAME, API_KEY, Loopback::new(addr)).unwrap();

    // Step 1: the façade resolves a GET for /projects on the Codebase host.
    let response = api.get_all_projects().unwrap();
    let seen = api.http().transport().seen();
    assert_eq!(seen.len(), 1);
    let request = &seen[0];
    assert_eq!(request.host, "api3.codebasehq.com");
    assert_eq!(request.port, 443);
    assert_eq!(request.path, "/projects");
    assert_eq!(request.header("Content-type"), Some("application/xml"));

    // Step 2: the Authorization header carries account/username:api_key.
    let auth = request.header("Authorization").unwrap();
    let decoded = STANDARD.decode(auth.strip_prefix("Basic ").unwrap()).unwrap();
    assert_eq!(decoded, b"aTech/alice:key123");

    // Step 3: status and body come back exactly as the server sent them.
    assert_eq!(response.status, 200);
    assert_eq!(response.body, fetch_direct(addr, "/projects"));
    assert!(response
        .headers
        .iter()
        .any(|(n, v)| n == "content-type" && v.starts_with("application/xml")));
    assert!(response.text().contains("<permalink>codebase</permalink>"));
}

#[test]
fn project_and_tickets_end_to_end() {
    let addr = start_mock();
    let api = CodebaseApi::with_transport(ACCOUNT, USERNAME, API_KEY, Loopback::new(addr)).unwrap();

    let project = api.get_project("codebase").unwrap();
    assert_eq!(project.status, 200);
    assert_eq!(project.body, fetch_direct(addr, "/codebase"));

    let query = TicketQuery {
        query: Some("status:open".to_string()),
        page: None,
    };
    let tickets = api.get_tickets("codebase", &query).unwrap();
    assert_eq!(tickets.status, 200);
    assert_eq!(tickets.text().matches("<ticket>").count(), 2);

    let seen = api.http().transport().seen();
    assert_eq!(seen[1].path, "/codebase/tickets?query=status%3Aopen");
}

#[test]
fn http_errors_are_plain_responses() {
    let addr = start_mock();

    let api = CodebaseApi::with_transport(ACCOUNT, USERNAME, "wrong-key", Loopback::new(addr)).unwrap();
    let denied = api.get_all_projects().unwrap();
    assert_eq!(denied.status, 401);
    assert_eq!(denied.text(), "HTTP Basic: Access denied.\n");

    let api = CodebaseApi::with_transport(ACCOUNT, USERNAME, API_KEY, Loopback::new(addr)).unwrap();
    let missing = api.get_project("does-not-exist").unwrap();
    assert_eq!(missing.status, 404);
}

#[test]
fn caller_authorization_overrides_basic_auth() {
    let addr = start_mock();
    let client = authed_client(addr);

    let options = RequestOptions::default().header("Authorization", "Bearer not-basic");
    let response = client.get("/projects", &options).unwrap();
    assert_eq!(response.status, 401);
    let seen = client.transport().seen();
    assert_eq!(seen[0].header("Authorization"), Some("Bearer not-basic"));
}

fn authed_client(addr: SocketAddr) -> HttpClient<Loopback> {
    HttpClient::with_transport(
        BASE_URL,
        ClientOptions {
            auth: Some(BasicAuth::new("aTech/alice", "key123")),
            timeout: None,
        },
        Loopback::new(addr),
    )
    .unwrap()
}

#[test]
fn redirects_are_returned_not_followed() {
    let addr = start_mock();
    let client = authed_client(addr);

    let response = client.get("/moved", &RequestOptions::default()).unwrap();
    assert_eq!(response.status, 307);
    assert!(response
        .headers
        .iter()
        .any(|(n, v)| n == "location" && v == "/projects"));
    assert!(response.body.is_empty());
    assert_eq!(client.transport().seen().len(), 1);
}

#[test]
fn bodies_above_ten_mib_are_read_in_full() {
    let addr = start_mock();
    let client = authed_client(addr);

    let response = client.get("/large", &RequestOptions::default()).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body.len(), LARGE_BODY_LEN);
    assert!(response.body.iter().all(|&b| b == b'x'));
}

#[test]
fn encoded_bodies_pass_through_undecoded() {
    let addr = start_mock();
    let client = authed_client(addr);

    let response = client.get("/gzipped", &RequestOptions::default()).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, GZIP_BODY);
    // No Accept-Encoding was added on the way out.
    assert!(response
        .headers
        .iter()
        .any(|(n, v)| n == "x-accept-encoding" && v == "none"));
}

#[test]
fn slow_responses_time_out() {
    let addr = start_mock();
    let client = authed_client(addr);

    let options = RequestOptions::default().timeout(Duration::from_millis(500));
    let err = client.get("/slow", &options).unwrap_err();
    match err {
        ClientError::Transport(TransportError::Timeout { host, timeout }) => {
            assert_eq!(host, "api3.codebasehq.com");
            assert_eq!(timeout, Duration::from_millis(500));
        }
        other => panic!("expected timeout, got {other}"),
    }

    // The override applied to that call only.
    let seen = client.transport().seen();
    assert_eq!(seen[0].timeout, Duration::from_millis(500));
    assert_eq!(client.timeout(), Duration::from_secs(60));
}

#[test]
fn unresolvable_host_is_a_transport_error() {
    let client = HttpClient::new(
        "https://codebase.invalid",
        ClientOptions {
            auth: None,
            timeout: Some(Duration::from_secs(5)),
        },
    )
    .unwrap();

    let err = client.get("/projects", &RequestOptions::default()).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "unexpected error: {err}");
}
