//! Tool handlers for MCP server.
//!
//! Malformed tool arguments are protocol errors (`-32602`). Failures while
//! talking to Azure DevOps, including an unknown pipeline name, come back as
//! tool results flagged with `isError` so the model can read them.

use std::collections::BTreeMap;

use azdo_core::{Error, PipelineService, RunRequest};
use serde::Deserialize;
use serde_json::Value;

use crate::protocol::{JsonRpcError, ToolCallResult, ToolDefinition};

pub const LIST_PIPELINES: &str = "list_pipelines";
pub const TRIGGER_PIPELINE: &str = "trigger_pipeline";

/// Tool handler that executes tools against the pipeline service.
pub struct ToolHandler {
    service: PipelineService,
}

impl ToolHandler {
    pub fn new(service: PipelineService) -> Self {
        Self { service }
    }

    /// Get available tool definitions.
    pub fn available_tools(&self) -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: LIST_PIPELINES.to_string(),
                description: "List all pipelines in the Azure DevOps project".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
            ToolDefinition {
                name: TRIGGER_PIPELINE.to_string(),
                description: "Trigger a pipeline run by name".to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "name": {
                            "type": "string",
                            "description": "Name of the pipeline to trigger (exact, case-sensitive)"
                        },
                        "variables": {
                            "type": "object",
                            "description": "Optional variables to pass to the pipeline",
                            "additionalProperties": { "type": "string" }
                        },
                        "branch": {
                            "type": "string",
                            "description": "Optional branch to run (e.g. main or refs/heads/main)"
                        }
                    },
                    "required": ["name"]
                }),
            },
        ]
    }

    /// Execute a tool by name with arguments.
    pub async fn execute(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<ToolCallResult, JsonRpcError> {
        let result = match name {
            LIST_PIPELINES => self.handle_list_pipelines().await,
            TRIGGER_PIPELINE => self.handle_trigger_pipeline(arguments).await,
            _ => return Ok(ToolCallResult::error(format!("Unknown tool: {}", name))),
        };

        match result {
            Ok(text) => Ok(ToolCallResult::text(text)),
            Err(Error::InvalidInput(msg)) => Err(JsonRpcError::invalid_params(&msg)),
            Err(e) => {
                tracing::warn!("Error handling tool {}: {}", name, e);
                Ok(ToolCallResult::error(format!("Error: {}", e)))
            }
        }
    }

    async fn handle_list_pipelines(&self) -> azdo_core::Result<String> {
        let pipelines = self.service.list_pipelines().await?;
        Ok(serde_json::to_string_pretty(&pipelines)?)
    }

    async fn handle_trigger_pipeline(&self, arguments: Option<Value>) -> azdo_core::Result<String> {
        let params = TriggerPipelineParams::parse(arguments)?;

        let request = RunRequest {
            variables: params.variables.unwrap_or_default(),
            branch: params.branch,
        };
        let run = self.service.trigger_run(&params.name, request).await?;
        Ok(serde_json::to_string_pretty(&run)?)
    }
}

/// Parameters for trigger_pipeline tool.
#[derive(Debug, Default, Deserialize)]
struct TriggerPipelineParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    variables: Option<BTreeMap<String, String>>,
    #[serde(default)]
    branch: Option<String>,
}

impl TriggerPipelineParams {
    fn parse(arguments: Option<Value>) -> azdo_core::Result<Self> {
        let params: Self = match arguments {
            Some(value) => serde_json::from_value(value)
                .map_err(|e| Error::InvalidInput(format!("Invalid arguments: {}", e)))?,
            None => Self::default(),
        };

        if params.name.trim().is_empty() {
            return Err(Error::InvalidInput("Pipeline name is required".to_string()));
        }
        Ok(params)
    }
}
