//! Name resolution and run dispatch on top of a [`PipelineProvider`].
//!
//! Triggering by name is a two step sequence: list pipelines to resolve the
//! name to an id, then queue the run. Each step fails differently:
//!
//! - list call fails: [`Error::Upstream`] with [`Stage::ListPipelines`]
//! - no pipeline with that name: [`Error::PipelineNotFound`]
//! - trigger call fails: [`Error::Upstream`] with [`Stage::TriggerRun`]
//!
//! [`Stage::ListPipelines`]: crate::Stage::ListPipelines
//! [`Stage::TriggerRun`]: crate::Stage::TriggerRun

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::provider::PipelineProvider;
use crate::types::{Pipeline, PipelineRun, RunRequest};

/// First pipeline whose name matches exactly (case-sensitive).
pub fn find_by_name<'a>(pipelines: &'a [Pipeline], name: &str) -> Option<&'a Pipeline> {
    pipelines.iter().find(|p| p.name == name)
}

/// Pipeline operations shared by every front-end.
#[derive(Clone)]
pub struct PipelineService {
    provider: Arc<dyn PipelineProvider>,
}

impl PipelineService {
    pub fn new(provider: Arc<dyn PipelineProvider>) -> Self {
        Self { provider }
    }

    /// List all pipelines in the project.
    pub async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let pipelines = self.provider.list_pipelines().await?;
        debug!(
            provider = self.provider.provider_name(),
            count = pipelines.len(),
            "Listed pipelines"
        );
        Ok(pipelines)
    }

    /// Resolve a pipeline by exact name. `Ok(None)` when nothing matches.
    pub async fn find_pipeline_by_name(&self, name: &str) -> Result<Option<Pipeline>> {
        let pipelines = self.list_pipelines().await?;
        Ok(find_by_name(&pipelines, name).cloned())
    }

    /// Resolve `name` and queue a run of the matching pipeline.
    pub async fn trigger_run(&self, name: &str, request: RunRequest) -> Result<PipelineRun> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("Pipeline name is required".to_string()));
        }

        let pipeline = self
            .find_pipeline_by_name(name)
            .await?
            .ok_or_else(|| Error::PipelineNotFound(name.to_string()))?;

        debug!(
            pipeline_id = pipeline.id,
            variables = request.variables.len(),
            "Resolved pipeline, queueing run"
        );

        let run = self.provider.queue_run(&pipeline, &request).await?;

        info!(
            pipeline = %pipeline.name,
            run_id = run.id,
            status = %run.status,
            "Pipeline run queued"
        );
        Ok(run)
    }
}
