//! Tool handler exposing [`RegistryService`] over MCP

use rmcp::handler::server::tool::{ToolCallContext, ToolRouter};
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Content, ErrorData, Implementation, ListToolsResult,
    PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{tool, tool_router, RoleServer, ServerHandler};
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::unknown_tool;
use crate::harbor::ProjectMetadata;
use crate::service::models::DeleteResponse;
use crate::service::{RegistryService, ServiceError};

/// Catalogue order used by `tools/list` and the `tools` command
pub const TOOL_NAMES: [&str; 11] = [
    "list_projects",
    "get_project",
    "create_project",
    "delete_project",
    "list_repositories",
    "delete_repository",
    "list_tags",
    "delete_tag",
    "list_charts",
    "list_chart_versions",
    "delete_chart",
];

const INSTRUCTIONS: &str = "Manage a Harbor registry: list, inspect, create and delete projects; \
list and delete repositories and tags; list and delete Helm charts stored as OCI artifacts. \
projectId accepts a numeric project ID or a project name.";

/// Accept a string, or a number rendered as a string. Empty strings pass
/// through for the service to reject.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectArgs {
    /// Project ID or name
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub project_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateProjectArgs {
    /// Name of the new project
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub project_name: String,
    /// Harbor project metadata, e.g. `public`, `enable_content_trust`,
    /// `prevent_vul`, `severity`, `auto_scan`; values are strings
    pub metadata: Option<ProjectMetadata>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryArgs {
    /// Project ID or name
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub project_id: String,
    /// Repository name within the project
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub repository_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TagArgs {
    /// Project ID or name
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub project_id: String,
    /// Repository name within the project
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub repository_name: String,
    /// Tag to delete
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub tag: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartArgs {
    /// Project ID or name
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub project_id: String,
    /// Chart name, stored under `<project>/charts/<chartName>`
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub chart_name: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartVersionArgs {
    /// Project ID or name
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub project_id: String,
    /// Chart name, stored under `<project>/charts/<chartName>`
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub chart_name: String,
    /// Chart version (artifact tag)
    #[serde(deserialize_with = "string_or_number")]
    #[schemars(with = "String")]
    pub version: String,
}

/// Log a service failure by tier and convert it for the client
fn tool_error(tool: &'static str, err: ServiceError) -> ErrorData {
    match &err {
        ServiceError::Internal { .. } => tracing::error!(tool, "{}", err),
        _ => tracing::debug!(tool, "Tool call rejected: {}", err),
    }
    err.into()
}

fn pretty<T: Serialize>(
    tool: &'static str,
    result: Result<T, ServiceError>,
) -> Result<CallToolResult, ErrorData> {
    let value = result.map_err(|e| tool_error(tool, e))?;
    let text = serde_json::to_string_pretty(&value).map_err(|e| {
        tool_error(
            tool,
            ServiceError::internal(format!("Failed to serialize result: {}", e)),
        )
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn confirmation(
    tool: &'static str,
    result: Result<DeleteResponse, ServiceError>,
) -> Result<CallToolResult, ErrorData> {
    let response = result.map_err(|e| tool_error(tool, e))?;
    Ok(CallToolResult::success(vec![Content::text(response.message)]))
}

fn catalogue_position(tool: &Tool) -> usize {
    TOOL_NAMES
        .iter()
        .position(|name| tool.name == *name)
        .unwrap_or(TOOL_NAMES.len())
}

/// MCP server handler; one clone per session, all sharing the registry client
#[derive(Clone)]
pub struct HarborMcp {
    tool_router: ToolRouter<Self>,
    service: RegistryService,
}

#[tool_router]
impl HarborMcp {
    pub fn new(service: RegistryService) -> Self {
        Self {
            tool_router: Self::tool_router(),
            service,
        }
    }

    /// Tool definitions in catalogue order
    pub fn catalogue() -> Vec<Tool> {
        let mut tools = Self::tool_router().list_all();
        tools.sort_by_key(catalogue_position);
        tools
    }

    fn ensure_known(&self, name: &str) -> Result<(), ErrorData> {
        if self.tool_router.list_all().iter().any(|tool| tool.name == name) {
            Ok(())
        } else {
            Err(unknown_tool(name))
        }
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List all projects in Harbor"
    )]
    async fn list_projects(&self) -> Result<CallToolResult, ErrorData> {
        pretty("list_projects", self.service.list_projects().await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "Get project details by ID or name"
    )]
    async fn get_project(
        &self,
        Parameters(args): Parameters<ProjectArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        pretty("get_project", self.service.get_project(&args.project_id).await)
    }

    #[tool(description = "Create a new project in Harbor")]
    async fn create_project(
        &self,
        Parameters(args): Parameters<CreateProjectArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        pretty(
            "create_project",
            self.service
                .create_project(&args.project_name, args.metadata)
                .await,
        )
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Delete a project by ID or name"
    )]
    async fn delete_project(
        &self,
        Parameters(args): Parameters<ProjectArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        confirmation(
            "delete_project",
            self.service.delete_project(&args.project_id).await,
        )
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List all repositories in a project"
    )]
    async fn list_repositories(
        &self,
        Parameters(args): Parameters<ProjectArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        pretty(
            "list_repositories",
            self.service.list_repositories(&args.project_id).await,
        )
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Delete a repository"
    )]
    async fn delete_repository(
        &self,
        Parameters(args): Parameters<RepositoryArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        confirmation(
            "delete_repository",
            self.service
                .delete_repository(&args.project_id, &args.repository_name)
                .await,
        )
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List all tags in a repository"
    )]
    async fn list_tags(
        &self,
        Parameters(args): Parameters<RepositoryArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        pretty(
            "list_tags",
            self.service
                .list_tags(&args.project_id, &args.repository_name)
                .await,
        )
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Delete a tag from a repository"
    )]
    async fn delete_tag(
        &self,
        Parameters(args): Parameters<TagArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        confirmation(
            "delete_tag",
            self.service
                .delete_tag(&args.project_id, &args.repository_name, &args.tag)
                .await,
        )
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List all Helm charts in a project"
    )]
    async fn list_charts(
        &self,
        Parameters(args): Parameters<ProjectArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        pretty("list_charts", self.service.list_charts(&args.project_id).await)
    }

    #[tool(
        annotations(read_only_hint = true),
        description = "List all versions of a Helm chart"
    )]
    async fn list_chart_versions(
        &self,
        Parameters(args): Parameters<ChartArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        pretty(
            "list_chart_versions",
            self.service
                .list_chart_versions(&args.project_id, &args.chart_name)
                .await,
        )
    }

    #[tool(
        annotations(destructive_hint = true),
        description = "Delete a specific version of a Helm chart"
    )]
    async fn delete_chart(
        &self,
        Parameters(args): Parameters<ChartVersionArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        confirmation(
            "delete_chart",
            self.service
                .delete_chart_version(&args.project_id, &args.chart_name, &args.version)
                .await,
        )
    }
}

/// `tools/list` and `tools/call` are routed by hand so an unknown tool name
/// answers method-not-found rather than the router's invalid-params.
impl ServerHandler for HarborMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Harbor registry".to_string()),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let mut tools = self.tool_router.list_all();
        tools.sort_by_key(catalogue_position);
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        self.ensure_known(&request.name)?;
        tracing::debug!(tool = %request.name, "Calling tool");
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
