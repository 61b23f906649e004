//! Azure DevOps Pipelines API client implementation.

use async_trait::async_trait;
use azdo_core::config::{AzureSettings, DEFAULT_API_VERSION, DEFAULT_BASE_URL};
use azdo_core::{Error, Pipeline, PipelineProvider, PipelineRef, PipelineRun, Result, RunRequest, Stage};
use reqwest::Url;
use tracing::{debug, warn};

use crate::types::{web_href, AzurePipeline, AzurePipelineList, AzureRun, RunPipelineRequest};
use crate::PROVIDER_NAME;

/// Azure DevOps API client.
///
/// Authenticates with HTTP Basic auth: empty username, personal access token
/// as password.
pub struct AzureDevOpsClient {
    base_url: String,
    organization: String,
    project: String,
    api_version: String,
    token: String,
    client: reqwest::Client,
}

impl AzureDevOpsClient {
    /// Create a new client against `https://dev.azure.com`.
    pub fn new(
        organization: impl Into<String>,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, organization, project, token)
    }

    /// Create a new client with a custom base URL (Azure DevOps Server, tests).
    pub fn with_base_url(
        base_url: impl Into<String>,
        organization: impl Into<String>,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            organization: organization.into(),
            project: project.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from validated settings.
    pub fn from_settings(settings: &AzureSettings) -> Self {
        Self::with_base_url(
            settings.base_url.clone(),
            settings.organization.clone(),
            settings.project.clone(),
            settings.token.clone(),
        )
        .with_api_version(settings.api_version.clone())
    }

    /// Override the `api-version` query parameter.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Build `{base}/{org}/{project}/_apis/{segments...}?api-version=...`.
    ///
    /// Organization and project are percent-encoded as path segments.
    fn project_url(&self, segments: &[&str], stage: Stage) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push(&self.organization)
            .push(&self.project)
            .push("_apis")
            .extend(segments);

        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);

        debug!(stage = %stage, url = %url, "Built Azure DevOps URL");
        Ok(url)
    }

    /// Build request with common headers.
    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth("", Some(&self.token))
            .header("Accept", "application/json")
    }

    /// Make an authenticated GET request with typed deserialization.
    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url, stage: Stage) -> Result<T> {
        debug!(url = %url, "Azure DevOps GET request");

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| Error::transport(stage, e.to_string()))?;

        self.handle_response(response, stage).await
    }

    /// Make an authenticated POST request.
    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize>(
        &self,
        url: Url,
        body: &B,
        stage: Stage,
    ) -> Result<T> {
        debug!(url = %url, "Azure DevOps POST request");

        let response = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::transport(stage, e.to_string()))?;

        self.handle_response(response, stage).await
    }

    /// Handle response and map errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        stage: Stage,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                stage = %stage,
                message = %message,
                "Azure DevOps API error response"
            );
            return Err(Error::from_status(stage, status_code, message));
        }

        response.json().await.map_err(|e| Error::Upstream {
            stage,
            status: Some(status.as_u16()),
            message: format!("Failed to parse response: {}", e),
        })
    }
}

// =============================================================================
// Mapping functions: Azure types -> Unified types
// =============================================================================

fn map_pipeline(az_pipeline: &AzurePipeline) -> Pipeline {
    Pipeline {
        id: az_pipeline.id,
        name: az_pipeline.name.clone(),
        folder: az_pipeline.folder.clone(),
        revision: az_pipeline.revision,
        web_url: web_href(az_pipeline.links.as_ref()),
    }
}

fn map_run(az_run: &AzureRun, pipeline: &Pipeline) -> PipelineRun {
    let pipeline_ref = match &az_run.pipeline {
        Some(p) => PipelineRef {
            id: p.id,
            name: p.name.clone().unwrap_or_else(|| pipeline.name.clone()),
        },
        None => PipelineRef {
            id: pipeline.id,
            name: pipeline.name.clone(),
        },
    };

    PipelineRun {
        id: az_run.id,
        name: az_run.name.clone(),
        status: az_run.state.clone(),
        result: az_run.result.clone(),
        created_date: az_run.created_date.clone(),
        pipeline: pipeline_ref,
        web_url: web_href(az_run.links.as_ref()),
    }
}

#[async_trait]
impl PipelineProvider for AzureDevOpsClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let stage = Stage::ListPipelines;
        let url = self.project_url(&["pipelines"], stage)?;
        let list: AzurePipelineList = self.get(url, stage).await?;

        Ok(list.value.iter().map(map_pipeline).collect())
    }

    async fn queue_run(&self, pipeline: &Pipeline, request: &RunRequest) -> Result<PipelineRun> {
        let stage = Stage::TriggerRun;
        let id = pipeline.id.to_string();
        let url = self.project_url(&["pipelines", &id, "runs"], stage)?;
        let body = RunPipelineRequest::from(request);

        let run: AzureRun = self.post(url, &body, stage).await?;
        Ok(map_run(&run, pipeline))
    }
}
