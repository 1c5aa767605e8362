//! Harbor v2.0 REST API wire types
//!
//! Only the fields this server reads are declared; everything else in the
//! registry's responses is ignored on deserialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Project as returned by `GET /projects` and `GET /projects/{id}`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HarborProject {
    pub project_id: i64,
    pub name: String,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub repo_count: Option<i64>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Repository as returned by `GET /projects/{project}/repositories`
///
/// `name` is fully qualified, e.g. `library/nginx` or `library/charts/redis`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HarborRepository {
    pub name: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub artifact_count: Option<i64>,
    #[serde(default)]
    pub pull_count: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creation_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
}

/// Tag attached to an artifact
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HarborArtifactTag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed: Option<bool>,
}

/// Artifact as returned by `GET .../artifacts?with_tag=true`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct HarborArtifact {
    pub digest: String,
    #[serde(default)]
    pub tags: Option<Vec<HarborArtifactTag>>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub push_time: Option<String>,
    #[serde(default)]
    pub pull_time: Option<String>,
    #[serde(default)]
    pub update_time: Option<String>,
    #[serde(default, rename = "type")]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub repository_id: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
}

impl HarborArtifact {
    /// Whether any tag on this artifact has exactly the given name
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|tag| tag.name == name)
    }
}

/// Body of `POST /projects`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreateProjectRequest {
    pub project_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}
