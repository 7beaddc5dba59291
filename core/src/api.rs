//! High-level Codebase HQ client.
//!
//! Codebase HQ does not ship an SDK, only a REST API answering in XML. To get
//! the credentials open "My Profile" from the settings menu of your Codebase
//! HQ page and scroll down to "API Credentials".
//!
//! ```no_run
//! use codebase_core::CodebaseApi;
//!
//! let api = CodebaseApi::new("aTech", "alice", "key123")?;
//! let projects = api.get_all_projects()?;
//! println!("{}", projects.text());
//! # Ok::<(), codebase_core::ApiError>(())
//! ```

use crate::auth::Credentials;
use crate::client::{ClientOptions, HttpClient};
use crate::endpoint::Endpoint;
use crate::error::{ApiError, ClientError};
use crate::http::{HttpResponse, RequestOptions, Transport, UreqTransport};

/// Root of the Codebase HQ API.
pub const BASE_URL: &str = "https://api3.codebasehq.com";

/// Headers sent with every request.
pub const COMMON_HEADERS: [(&str, &str); 1] = [("Content-type", "application/xml")];

/// Search options for `CodebaseApi::get_tickets`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketQuery {
    /// Codebase search string, e.g. `status:open assignee:me`.
    pub query: Option<String>,
    /// 1-based result page.
    pub page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CodebaseApi<T = UreqTransport> {
    credentials: Credentials,
    http: HttpClient<T>,
}

impl CodebaseApi<UreqTransport> {
    /// Fails with `ApiError::Credential` when any argument is empty.
    pub fn new(account_name: &str, username: &str, api_key: &str) -> Result<Self, ApiError> {
        Self::with_transport(account_name, username, api_key, UreqTransport)
    }
}

impl<T: Transport> CodebaseApi<T> {
    pub fn with_transport(account_name: &str, username: &str, api_key: &str, transport: T) -> Result<Self, ApiError> {
        let credentials = Credentials::new(account_name, username, api_key)?;
        let options = ClientOptions {
            auth: Some(credentials.basic_auth()),
            timeout: None,
        };
        let http = HttpClient::with_transport(BASE_URL, options, transport)?;
        Ok(Self { credentials, http })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Underlying transport client.
    pub fn http(&self) -> &HttpClient<T> {
        &self.http
    }

    /// `GET /projects`: all projects of the account.
    ///
    /// The body is the server's XML, e.g.
    ///
    /// ```text
    /// <projects type="array">
    ///   <project>
    ///     <group-id type="integer" nil="true"/>
    ///     <icon type="integer">1</icon>
    ///     <name>Codebase</name>
    ///     <account-name>aTech Media</account-name>
    ///     <permalink>codebase</permalink>
    ///     <start-page>overview</start-page>
    ///     <status>active</status>
    ///     <total-tickets>100</total-tickets>
    ///     <open-tickets>36</open-tickets>
    ///     <closed-tickets>64</closed-tickets>
    ///   </project>
    /// </projects>
    /// ```
    pub fn get_all_projects(&self) -> Result<HttpResponse, ClientError> {
        self.call(&Endpoint::AllProjects, Vec::new())
    }

    /// `GET /{permalink}`: one project. An empty permalink fails with
    /// `ClientError::EmptyPermalink` before anything is sent.
    pub fn get_project(&self, permalink: &str) -> Result<HttpResponse, ClientError> {
        let endpoint = Endpoint::Project {
            permalink: permalink.to_string(),
        };
        self.call(&endpoint, Vec::new())
    }

    /// `GET /{permalink}/tickets`, optionally filtered and paged.
    pub fn get_tickets(&self, permalink: &str, query: &TicketQuery) -> Result<HttpResponse, ClientError> {
        let endpoint = Endpoint::Tickets {
            permalink: permalink.to_string(),
        };
        let mut params = Vec::new();
        if let Some(q) = &query.query {
            params.push(("query".to_string(), q.clone()));
        }
        if let Some(page) = query.page {
            params.push(("page".to_string(), page.to_string()));
        }
        self.call(&endpoint, params)
    }

    fn call(&self, endpoint: &Endpoint, params: Vec<(String, String)>) -> Result<HttpResponse, ClientError> {
        let options = RequestOptions {
            headers: common_headers(),
            params,
            timeout: None,
        };
        self.http.get(&endpoint.path()?, &options)
    }
}

fn common_headers() -> Vec<(String, String)> {
    COMMON_HEADERS
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
