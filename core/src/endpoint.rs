//! Codebase HQ endpoints reachable through `CodebaseApi`.

use crate::error::ClientError;

/// One remote operation and the parameters its path needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Every project in the account.
    AllProjects,
    /// A single project, addressed by its permalink.
    Project { permalink: String },
    /// Tickets of one project.
    Tickets { permalink: String },
}

impl Endpoint {
    /// Logical operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::AllProjects => "all_projects",
            Endpoint::Project { .. } => "project",
            Endpoint::Tickets { .. } => "tickets",
        }
    }

    /// Path relative to the API host. The permalink is percent-encoded as a
    /// single path segment.
    pub fn path(&self) -> Result<String, ClientError> {
        match self {
            Endpoint::AllProjects => Ok("/projects".to_string()),
            Endpoint::Project { permalink } => Ok(format!("/{}", segment(permalink)?)),
            Endpoint::Tickets { permalink } => Ok(format!("/{}/tickets", segment(permalink)?)),
        }
    }
}

fn segment(permalink: &str) -> Result<String, ClientError> {
    if permalink.is_empty() {
        return Err(ClientError::EmptyPermalink);
    }
    Ok(urlencoding::encode(permalink).into_owned())
}
