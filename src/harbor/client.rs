use async_trait::async_trait;
use reqwest::{header::LOCATION, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::error::HarborError;
use super::models::{CreateProjectRequest, HarborArtifact, HarborProject, HarborRepository};
use super::{ProjectRef, RegistryClient};
use crate::settings::HarborSettings;

const API_PREFIX: &str = "/api/v2.0";
const PAGE_SIZE: usize = 100;
const RESOURCE_NAME_HEADER: &str = "X-Is-Resource-Name";

/// Harbor REST API client using HTTP basic authentication
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HarborClient {
    http: Client,
    api_base: String,
    username: String,
    password: String,
}

impl HarborClient {
    /// Create a client for the registry at `url`
    ///
    /// `url` may be the registry root (`https://harbor.example.com`) or already
    /// point at the API (`https://harbor.example.com/api/v2.0`).
    pub fn new(
        url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        insecure: bool,
    ) -> Result<Self, HarborError> {
        let mut builder =
            Client::builder().user_agent(concat!("harbor-mcp/", env!("CARGO_PKG_VERSION")));
        if insecure {
            tracing::warn!(
                "TLS certificate verification is disabled for requests to {}",
                url
            );
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(HarborError::Client)?;

        Ok(Self {
            http,
            api_base: api_base(url),
            username: username.into(),
            password: password.into(),
        })
    }

    pub fn from_settings(settings: &HarborSettings) -> Result<Self, HarborError> {
        Self::new(
            &settings.url,
            settings.username.clone(),
            settings.password.clone(),
            settings.insecure,
        )
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .basic_auth(&self.username, Some(&self.password))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, HarborError> {
        tracing::debug!(url = %url, "Sending Harbor request");
        request.send().await.map_err(|source| HarborError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// Send and turn any non-2xx answer into [`HarborError::Status`]
    async fn send_ok(&self, request: RequestBuilder, url: &str) -> Result<Response, HarborError> {
        let response = self.send(request, url).await?;
        error_for_status(response, url).await
    }

    /// Fetch every page of a list endpoint
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        extra_query: &[(&str, &str)],
    ) -> Result<Vec<T>, HarborError> {
        let url = self.url(path);
        let mut items = Vec::new();
        let mut page = 1usize;

        loop {
            let request = self
                .request(Method::GET, &url)
                .query(extra_query)
                .query(&[("page", page.to_string()), ("page_size", PAGE_SIZE.to_string())]);
            let response = self.send_ok(request, &url).await?;

            // Harbor answers `null` instead of `[]` for some empty collections
            let batch: Option<Vec<T>> =
                response
                    .json()
                    .await
                    .map_err(|source| HarborError::Decode {
                        url: url.clone(),
                        source,
                    })?;
            let batch = batch.unwrap_or_default();
            let received = batch.len();
            items.extend(batch);

            if received < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    fn project_request(&self, method: Method, project: &ProjectRef) -> (RequestBuilder, String) {
        let url = self.url(&format!("/projects/{}", project_segment(project)));
        let mut request = self.request(method, &url);
        if project.is_name() {
            request = request.header(RESOURCE_NAME_HEADER, "true");
        }
        (request, url)
    }
}

#[async_trait]
impl RegistryClient for HarborClient {
    async fn list_projects(&self) -> Result<Vec<HarborProject>, HarborError> {
        self.get_all("/projects", &[]).await
    }

    async fn get_project(&self, project: &ProjectRef) -> Result<Option<HarborProject>, HarborError> {
        let (request, url) = self.project_request(Method::GET, project);
        let response = self.send(request, &url).await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = error_for_status(response, &url).await?;
        let project = response
            .json()
            .await
            .map_err(|source| HarborError::Decode { url, source })?;
        Ok(Some(project))
    }

    async fn create_project(&self, body: &CreateProjectRequest) -> Result<Option<i64>, HarborError> {
        let url = self.url("/projects");
        let request = self.request(Method::POST, &url).json(body);
        let response = self.send_ok(request, &url).await?;

        // The new id is only reported through the Location header
        let id = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .and_then(id_from_location);
        Ok(id)
    }

    async fn delete_project(&self, project: &ProjectRef) -> Result<(), HarborError> {
        let (request, url) = self.project_request(Method::DELETE, project);
        self.send_ok(request, &url).await?;
        Ok(())
    }

    async fn list_repositories(&self, project: &str) -> Result<Vec<HarborRepository>, HarborError> {
        let path = format!("/projects/{}/repositories", urlencoding::encode(project));
        self.get_all(&path, &[]).await
    }

    async fn delete_repository(&self, full_name: &str) -> Result<(), HarborError> {
        let (project, repository) = full_name
            .split_once('/')
            .filter(|(project, repository)| !project.is_empty() && !repository.is_empty())
            .ok_or_else(|| HarborError::InvalidRepositoryName(full_name.to_string()))?;

        let url = self.url(&repository_path(project, repository));
        let request = self.request(Method::DELETE, &url);
        self.send_ok(request, &url).await?;
        Ok(())
    }

    async fn list_artifacts(
        &self,
        project: &str,
        repository: &str,
    ) -> Result<Vec<HarborArtifact>, HarborError> {
        let path = format!("{}/artifacts", repository_path(project, repository));
        self.get_all(&path, &[("with_tag", "true")]).await
    }

    async fn delete_artifact(
        &self,
        project: &str,
        repository: &str,
        tag_or_digest: &str,
    ) -> Result<(), HarborError> {
        let url = self.url(&format!(
            "{}/artifacts/{}",
            repository_path(project, repository),
            urlencoding::encode(tag_or_digest)
        ));
        let request = self.request(Method::DELETE, &url);
        self.send_ok(request, &url).await?;
        Ok(())
    }
}

async fn error_for_status(response: Response, url: &str) -> Result<Response, HarborError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(HarborError::Status {
        url: url.to_string(),
        status,
        body,
    })
}

fn api_base(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with(API_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, API_PREFIX)
    }
}

fn project_segment(project: &ProjectRef) -> String {
    match project {
        ProjectRef::Id(id) => id.to_string(),
        ProjectRef::Name(name) => urlencoding::encode(name).into_owned(),
    }
}

/// Harbor wants repository names URL-encoded twice so nested names survive
/// its router: `charts/redis` becomes `charts%252Fredis`.
fn encode_repository(name: &str) -> String {
    urlencoding::encode(&urlencoding::encode(name)).into_owned()
}

fn repository_path(project: &str, repository: &str) -> String {
    format!(
        "/projects/{}/repositories/{}",
        urlencoding::encode(project),
        encode_repository(repository)
    )
}

fn id_from_location(location: &str) -> Option<i64> {
    location
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}
