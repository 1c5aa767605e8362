pub mod client;
pub mod error;
pub mod models;
#[cfg(test)]
pub mod testing;

pub use client::HarborClient;
pub use error::HarborError;

use async_trait::async_trait;
use models::{CreateProjectRequest, HarborArtifact, HarborProject, HarborRepository};
use serde_json::{Map, Value};
use std::fmt;

/// How a project is addressed on the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Id(i64),
    /// Sent with `X-Is-Resource-Name: true`
    Name(String),
}

impl ProjectRef {
    /// Anything that parses as a base-10 integer is an id, everything else a name.
    ///
    /// A project literally named `42` can therefore only be reached by its id.
    pub fn parse(value: &str) -> Self {
        match value.parse::<i64>() {
            Ok(id) => ProjectRef::Id(id),
            Err(_) => ProjectRef::Name(value.to_string()),
        }
    }

    pub fn is_name(&self) -> bool {
        matches!(self, ProjectRef::Name(_))
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectRef::Id(id) => write!(f, "{}", id),
            ProjectRef::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Remote registry operations the service is built on
///
/// Implemented by [`HarborClient`] for the real REST API and by an in-memory
/// recorder in tests.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<HarborProject>, HarborError>;

    /// Returns `None` when the registry answers 404
    async fn get_project(&self, project: &ProjectRef) -> Result<Option<HarborProject>, HarborError>;

    /// Create a project and return the id the registry assigned, if it reported one
    async fn create_project(&self, request: &CreateProjectRequest) -> Result<Option<i64>, HarborError>;

    async fn delete_project(&self, project: &ProjectRef) -> Result<(), HarborError>;

    async fn list_repositories(&self, project: &str) -> Result<Vec<HarborRepository>, HarborError>;

    /// Delete a repository by its fully qualified `<project>/<repository>` name
    async fn delete_repository(&self, full_name: &str) -> Result<(), HarborError>;

    async fn list_artifacts(
        &self,
        project: &str,
        repository: &str,
    ) -> Result<Vec<HarborArtifact>, HarborError>;

    async fn delete_artifact(
        &self,
        project: &str,
        repository: &str,
        tag_or_digest: &str,
    ) -> Result<(), HarborError>;
}

/// Project metadata forwarded verbatim on creation
pub type ProjectMetadata = Map<String, Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_ref_numeric_is_id() {
        assert_eq!(ProjectRef::parse("1"), ProjectRef::Id(1));
        assert_eq!(ProjectRef::parse("0042"), ProjectRef::Id(42));
    }

    #[test]
    fn test_project_ref_other_is_name() {
        assert_eq!(
            ProjectRef::parse("library"),
            ProjectRef::Name("library".to_string())
        );
        assert_eq!(ProjectRef::parse("1.5"), ProjectRef::Name("1.5".to_string()));
        assert_eq!(ProjectRef::parse("12abc"), ProjectRef::Name("12abc".to_string()));
        assert!(ProjectRef::parse("team-a").is_name());
    }

    #[test]
    fn test_project_ref_display() {
        assert_eq!(ProjectRef::Id(7).to_string(), "7");
        assert_eq!(ProjectRef::Name("demo".to_string()).to_string(), "demo");
    }
}
