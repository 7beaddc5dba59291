//! Codebase HQ credentials and HTTP Basic authentication.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::CredentialError;

/// Username/password pair for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// `Basic <base64(username:password)>`
    pub fn header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account name, username and API key as shown under "API Credentials" in
/// the Codebase HQ profile page.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    account_name: String,
    username: String,
    api_key: String,
}

impl Credentials {
    /// Fails when any of the three values is empty.
    pub fn new(account_name: &str, username: &str, api_key: &str) -> Result<Self, CredentialError> {
        for (field, value) in [
            ("account_name", account_name),
            ("username", username),
            ("api_key", api_key),
        ] {
            if value.is_empty() {
                return Err(CredentialError { field });
            }
        }
        Ok(Self {
            account_name: account_name.to_string(),
            username: username.to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// `account_name/username`, the identity Codebase HQ expects.
    pub fn identity(&self) -> String {
        format!("{}/{}", self.account_name, self.username)
    }

    pub fn basic_auth(&self) -> BasicAuth {
        BasicAuth::new(self.identity(), self.api_key.clone())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
