//! Normalized records returned by the service
//!
//! Each is built from a Harbor wire type and discarded after serialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::harbor::models::{HarborArtifact, HarborArtifactTag, HarborProject, HarborRepository};

/// Marks a repository as a chart: `<project>/charts/<chart>`
pub const CHART_PATH_MARKER: &str = "/charts/";

/// Repository path (within a project) holding the versions of a chart
pub fn chart_repository(chart_name: &str) -> String {
    format!("charts/{}", chart_name)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub project_id: i64,
    pub name: String,
    pub creation_time: Option<String>,
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl From<HarborProject> for Project {
    fn from(project: HarborProject) -> Self {
        Self {
            project_id: project.project_id,
            name: project.name,
            creation_time: project.creation_time,
            update_time: project.update_time,
            owner_name: project.owner_name,
            repo_count: project.repo_count,
            metadata: project.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    pub name: String,
    pub artifact_count: i64,
    pub creation_time: Option<String>,
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pull_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<HarborRepository> for Repository {
    fn from(repository: HarborRepository) -> Self {
        Self {
            name: repository.name,
            artifact_count: repository.artifact_count.unwrap_or(0),
            creation_time: repository.creation_time,
            update_time: repository.update_time,
            pull_count: repository.pull_count,
            description: repository.description.filter(|d| !d.is_empty()),
        }
    }
}

/// One artifact of a repository with all of its tags
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagRecord {
    pub digest: String,
    pub tags: Vec<HarborArtifactTag>,
    pub size: Option<i64>,
    pub push_time: Option<String>,
    pub pull_time: Option<String>,
    #[serde(rename = "type")]
    pub artifact_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl From<HarborArtifact> for TagRecord {
    fn from(artifact: HarborArtifact) -> Self {
        Self {
            digest: artifact.digest,
            tags: artifact.tags.unwrap_or_default(),
            size: artifact.size,
            push_time: artifact.push_time,
            pull_time: artifact.pull_time,
            artifact_type: artifact.artifact_type,
            project_id: artifact.project_id,
            repository_id: artifact.repository_id,
            id: artifact.id,
        }
    }
}

/// A repository following the chart naming convention
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chart {
    pub name: String,
    pub total_versions: i64,
    /// Not resolved; always empty
    pub latest_version: String,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl Chart {
    /// `None` unless the repository name contains [`CHART_PATH_MARKER`]
    pub fn from_repository(repository: HarborRepository) -> Option<Self> {
        if !repository.name.contains(CHART_PATH_MARKER) {
            return None;
        }

        let name = repository
            .name
            .rsplit('/')
            .next()
            .unwrap_or(&repository.name)
            .to_string();

        Some(Self {
            name,
            total_versions: repository.artifact_count.unwrap_or(0),
            latest_version: String::new(),
            created: repository.creation_time,
            updated: repository.update_time,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartVersion {
    /// Artifact digest
    pub name: String,
    pub version: String,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl From<HarborArtifact> for ChartVersion {
    fn from(artifact: HarborArtifact) -> Self {
        let version = artifact
            .tags
            .as_deref()
            .and_then(|tags| tags.first())
            .map(|tag| tag.name.clone())
            .unwrap_or_default();
        let updated = artifact.update_time.or_else(|| artifact.push_time.clone());

        Self {
            name: artifact.digest,
            version,
            created: artifact.push_time,
            updated,
        }
    }
}

/// Confirmation of a delete
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
