//! Provider trait for the remote pipelines service.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Pipeline, PipelineRun, RunRequest};

/// Remote boundary for pipeline operations (Azure DevOps, test fakes, ...).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineProvider: Send + Sync {
    /// Get the provider name (e.g., "azure-devops")
    fn provider_name(&self) -> &'static str;

    /// Fetch every pipeline in the project, in service order.
    async fn list_pipelines(&self) -> Result<Vec<Pipeline>>;

    /// Queue a new run of an already-resolved pipeline.
    async fn queue_run(&self, pipeline: &Pipeline, request: &RunRequest) -> Result<PipelineRun>;
}
