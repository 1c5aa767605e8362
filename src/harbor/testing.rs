//! In-memory [`RegistryClient`] that records every call

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Mutex;

use super::models::{CreateProjectRequest, HarborArtifact, HarborProject, HarborRepository};
use super::{HarborError, ProjectRef, RegistryClient};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListProjects,
    GetProject(ProjectRef),
    CreateProject(CreateProjectRequest),
    DeleteProject(ProjectRef),
    ListRepositories(String),
    DeleteRepository(String),
    ListArtifacts { project: String, repository: String },
    DeleteArtifact { project: String, repository: String, reference: String },
}

/// Canned registry contents; `fail` makes every call answer 500
#[derive(Default)]
pub struct FakeRegistry {
    pub projects: Vec<HarborProject>,
    pub repositories: Vec<HarborRepository>,
    pub artifacts: Vec<HarborArtifact>,
    pub created_id: Option<i64>,
    pub fail: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), HarborError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            return Err(HarborError::Status {
                url: "http://harbor.test/api/v2.0".to_string(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "boom".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    async fn list_projects(&self) -> Result<Vec<HarborProject>, HarborError> {
        self.record(Call::ListProjects)?;
        Ok(self.projects.clone())
    }

    async fn get_project(&self, project: &ProjectRef) -> Result<Option<HarborProject>, HarborError> {
        self.record(Call::GetProject(project.clone()))?;
        let found = self.projects.iter().find(|candidate| match project {
            ProjectRef::Id(id) => candidate.project_id == *id,
            ProjectRef::Name(name) => &candidate.name == name,
        });
        Ok(found.cloned())
    }

    async fn create_project(&self, request: &CreateProjectRequest) -> Result<Option<i64>, HarborError> {
        self.record(Call::CreateProject(request.clone()))?;
        Ok(self.created_id)
    }

    async fn delete_project(&self, project: &ProjectRef) -> Result<(), HarborError> {
        self.record(Call::DeleteProject(project.clone()))
    }

    async fn list_repositories(&self, project: &str) -> Result<Vec<HarborRepository>, HarborError> {
        self.record(Call::ListRepositories(project.to_string()))?;
        Ok(self.repositories.clone())
    }

    async fn delete_repository(&self, full_name: &str) -> Result<(), HarborError> {
        self.record(Call::DeleteRepository(full_name.to_string()))
    }

    async fn list_artifacts(
        &self,
        project: &str,
        repository: &str,
    ) -> Result<Vec<HarborArtifact>, HarborError> {
        self.record(Call::ListArtifacts {
            project: project.to_string(),
            repository: repository.to_string(),
        })?;
        Ok(self.artifacts.clone())
    }

    async fn delete_artifact(
        &self,
        project: &str,
        repository: &str,
        tag_or_digest: &str,
    ) -> Result<(), HarborError> {
        self.record(Call::DeleteArtifact {
            project: project.to_string(),
            repository: repository.to_string(),
            reference: tag_or_digest.to_string(),
        })
    }
}
