pub mod error;
pub mod models;

pub use error::{ServiceError, ServiceErrorExt};

use std::sync::Arc;

use crate::harbor::models::{CreateProjectRequest, HarborArtifact};
use crate::harbor::{ProjectMetadata, ProjectRef, RegistryClient};
use models::{chart_repository, Chart, ChartVersion, DeleteResponse, Project, Repository, TagRecord};

/// Registry operations exposed as tools
///
/// Stateless apart from the shared client; every method validates its inputs
/// before touching the registry.
#[derive(Clone)]
pub struct RegistryService {
    client: Arc<dyn RegistryClient>,
}

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

impl RegistryService {
    pub fn new(client: Arc<dyn RegistryClient>) -> Self {
        Self { client }
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, ServiceError> {
        let projects = self
            .client
            .list_projects()
            .await
            .internal_err("Failed to get projects")?;
        Ok(projects.into_iter().map(Project::from).collect())
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, ServiceError> {
        let project_id = require(project_id, "projectId")?;
        let project = ProjectRef::parse(project_id);

        self.client
            .get_project(&project)
            .await
            .internal_err(format!("Failed to get project {}", project_id))?
            .map(Project::from)
            .ok_or_else(|| ServiceError::not_found(format!("Project {} not found", project_id)))
    }

    /// Create a project, then fetch it back by the id the registry assigned
    pub async fn create_project(
        &self,
        project_name: &str,
        metadata: Option<ProjectMetadata>,
    ) -> Result<Project, ServiceError> {
        let project_name = require(project_name, "project_name")?;

        let request = CreateProjectRequest {
            project_name: project_name.to_string(),
            metadata,
        };
        let id = self
            .client
            .create_project(&request)
            .await
            .internal_err("Failed to create project")?
            .ok_or_else(|| {
                ServiceError::internal("Failed to create project: No project ID returned")
            })?;

        tracing::info!(project = %project_name, id, "Created project");

        self.client
            .get_project(&ProjectRef::Id(id))
            .await
            .internal_err(format!("Failed to get created project {}", id))?
            .map(Project::from)
            .ok_or_else(|| ServiceError::not_found(format!("Project {} not found", id)))
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<DeleteResponse, ServiceError> {
        let project_id = require(project_id, "projectId")?;

        self.client
            .delete_project(&ProjectRef::parse(project_id))
            .await
            .internal_err(format!("Failed to delete project {}", project_id))?;

        Ok(DeleteResponse::new(format!(
            "Project {} deleted successfully",
            project_id
        )))
    }

    pub async fn list_repositories(&self, project_id: &str) -> Result<Vec<Repository>, ServiceError> {
        let project_id = require(project_id, "projectId")?;

        let repositories = self
            .client
            .list_repositories(project_id)
            .await
            .internal_err("Failed to get repositories")?;
        Ok(repositories.into_iter().map(Repository::from).collect())
    }

    pub async fn delete_repository(
        &self,
        project_id: &str,
        repository_name: &str,
    ) -> Result<DeleteResponse, ServiceError> {
        let project_id = require(project_id, "projectId")?;
        let repository_name = require(repository_name, "repositoryName")?;

        let full_name = format!("{}/{}", project_id, repository_name);
        self.client
            .delete_repository(&full_name)
            .await
            .internal_err(format!("Failed to delete repository {}", full_name))?;

        Ok(DeleteResponse::new(format!(
            "Repository {} deleted successfully",
            full_name
        )))
    }

    pub async fn list_tags(
        &self,
        project_id: &str,
        repository_name: &str,
    ) -> Result<Vec<TagRecord>, ServiceError> {
        let project_id = require(project_id, "projectId")?;
        let repository_name = require(repository_name, "repositoryName")?;

        let artifacts = self
            .client
            .list_artifacts(project_id, repository_name)
            .await
            .internal_err("Failed to get tags")?;
        Ok(artifacts.into_iter().map(TagRecord::from).collect())
    }

    pub async fn delete_tag(
        &self,
        project_id: &str,
        repository_name: &str,
        tag: &str,
    ) -> Result<DeleteResponse, ServiceError> {
        let project_id = require(project_id, "projectId")?;
        let repository_name = require(repository_name, "repositoryName")?;
        let tag = require(tag, "tag")?;

        let digest = self
            .find_tagged_digest(project_id, repository_name, tag, "Failed to delete tag")
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!(
                    "Tag {} not found in repository {}",
                    tag, repository_name
                ))
            })?;

        self.client
            .delete_artifact(project_id, repository_name, &digest)
            .await
            .internal_err("Failed to delete tag")?;

        Ok(DeleteResponse::new(format!("Tag {} deleted successfully", tag)))
    }

    pub async fn list_charts(&self, project_id: &str) -> Result<Vec<Chart>, ServiceError> {
        let project_id = require(project_id, "projectId")?;

        let repositories = self
            .client
            .list_repositories(project_id)
            .await
            .internal_err("Failed to get charts")?;
        Ok(repositories
            .into_iter()
            .filter_map(Chart::from_repository)
            .collect())
    }

    pub async fn list_chart_versions(
        &self,
        project_id: &str,
        chart_name: &str,
    ) -> Result<Vec<ChartVersion>, ServiceError> {
        let project_id = require(project_id, "projectId")?;
        let chart_name = require(chart_name, "chartName")?;

        let artifacts = self
            .client
            .list_artifacts(project_id, &chart_repository(chart_name))
            .await
            .internal_err("Failed to get chart versions")?;
        Ok(artifacts.into_iter().map(ChartVersion::from).collect())
    }

    pub async fn delete_chart_version(
        &self,
        project_id: &str,
        chart_name: &str,
        version: &str,
    ) -> Result<DeleteResponse, ServiceError> {
        let project_id = require(project_id, "projectId")?;
        let chart_name = require(chart_name, "chartName")?;
        let version = require(version, "version")?;

        let repository = chart_repository(chart_name);
        let digest = self
            .find_tagged_digest(project_id, &repository, version, "Failed to delete chart version")
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!(
                    "Chart version {} not found for chart {}",
                    version, chart_name
                ))
            })?;

        self.client
            .delete_artifact(project_id, &repository, &digest)
            .await
            .internal_err("Failed to delete chart version")?;

        Ok(DeleteResponse::new(format!(
            "Chart {} version {} deleted successfully",
            chart_name, version
        )))
    }

    /// Digest of the first artifact carrying exactly `tag`
    async fn find_tagged_digest(
        &self,
        project_id: &str,
        repository: &str,
        tag: &str,
        failure: &str,
    ) -> Result<Option<String>, ServiceError> {
        let artifacts = self
            .client
            .list_artifacts(project_id, repository)
            .await
            .internal_err(failure)?;

        Ok(artifacts
            .into_iter()
            .find(|artifact: &HarborArtifact| artifact.has_tag(tag))
            .map(|artifact| artifact.digest))
    }
}
