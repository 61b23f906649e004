//! Pipeline API handlers.

use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use azdo_core::{Pipeline, PipelineRun, PipelineService, RunRequest};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

const NAME_REQUIRED: &str = "Pipeline name is required";

/// One entry of `GET /pipelines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub id: u64,
    pub name: String,
    pub url: String,
}

impl From<Pipeline> for PipelineSummary {
    fn from(p: Pipeline) -> Self {
        Self {
            id: p.id,
            name: p.name,
            url: p.web_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineList {
    pub pipelines: Vec<PipelineSummary>,
}

/// Response of `POST /pipelines/run`. `name` is the pipeline's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub url: String,
}

impl From<PipelineRun> for RunSummary {
    fn from(run: PipelineRun) -> Self {
        Self {
            id: run.id,
            name: run.pipeline.name,
            status: run.status,
            url: run.web_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPipelineBody {
    #[serde(default)]
    pub pipeline_name: String,
    #[serde(default)]
    pub variables: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl RunPipelineBody {
    /// Validate a raw JSON body. A missing or blank `pipelineName` is
    /// reported before any other shape error.
    pub fn parse(value: Value) -> ApiResult<Self> {
        let has_name = value
            .get("pipelineName")
            .and_then(Value::as_str)
            .is_some_and(|n| !n.trim().is_empty());
        if !has_name {
            return Err(ApiError::BadRequest(NAME_REQUIRED.to_string()));
        }

        serde_json::from_value(value)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
    }
}

/// GET /pipelines
pub async fn list_pipelines(State(service): State<PipelineService>) -> ApiResult<Json<PipelineList>> {
    tracing::debug!("Listing all pipelines");

    let pipelines = service.list_pipelines().await?;

    Ok(Json(PipelineList {
        pipelines: pipelines.into_iter().map(PipelineSummary::from).collect(),
    }))
}

/// POST /pipelines/run
pub async fn run_pipeline(
    State(service): State<PipelineService>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<RunSummary>> {
    let value = match payload {
        Ok(Json(value)) => value,
        Err(rejection) => {
            tracing::debug!("Rejected run body: {}", rejection);
            return Err(ApiError::BadRequest(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )));
        }
    };

    let body = RunPipelineBody::parse(value)?;
    let name = body.pipeline_name;

    tracing::info!("Running pipeline: {}", name);

    let request = RunRequest {
        variables: body.variables.unwrap_or_default(),
        branch: body.branch,
    };
    let run = service.trigger_run(&name, request).await?;

    Ok(Json(RunSummary::from(run)))
}
