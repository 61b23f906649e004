//! Azure DevOps API request and response types.
//!
//! These types mirror the raw JSON of the Pipelines REST API.
//! They are deserialized and then mapped to unified types.

use std::collections::BTreeMap;

use azdo_core::RunRequest;
use serde::{Deserialize, Serialize};

// =============================================================================
// Links
// =============================================================================

/// `_links` object attached to most resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AzureLinks {
    #[serde(default)]
    pub web: Option<AzureLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureLink {
    pub href: String,
}

/// Browser URL from an optional `_links` object.
pub fn web_href(links: Option<&AzureLinks>) -> String {
    links
        .and_then(|l| l.web.as_ref())
        .map(|w| w.href.clone())
        .unwrap_or_default()
}

// =============================================================================
// Pipelines
// =============================================================================

/// Response of `GET _apis/pipelines`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzurePipelineList {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub value: Vec<AzurePipeline>,
}

/// Azure DevOps pipeline representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzurePipeline {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub revision: Option<u64>,
    /// REST URL of the resource (not the browser URL)
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "_links")]
    pub links: Option<AzureLinks>,
}

// =============================================================================
// Runs
// =============================================================================

/// Azure DevOps run representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureRun {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    /// unknown, inProgress, canceling, completed
    #[serde(default)]
    pub state: String,
    /// succeeded, failed, canceled, unknown (only once completed)
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default)]
    pub pipeline: Option<AzurePipelineRef>,
    #[serde(default, rename = "_links")]
    pub links: Option<AzureLinks>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzurePipelineRef {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

// =============================================================================
// Run request body
// =============================================================================

/// Body of `POST _apis/pipelines/{id}/runs`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunPipelineRequest {
    pub variables: BTreeMap<String, VariableValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<RunResources>,
}

/// Run-time variable, `{ "value": "..." }` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableValue {
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResources {
    pub repositories: RepositoryResources,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepositoryResources {
    #[serde(rename = "self")]
    pub self_repo: RepositoryRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    pub ref_name: String,
}

impl From<&RunRequest> for RunPipelineRequest {
    fn from(request: &RunRequest) -> Self {
        let variables = request
            .variables
            .iter()
            .map(|(key, value)| {
                (
                    key.clone(),
                    VariableValue {
                        value: value.clone(),
                    },
                )
            })
            .collect();

        let resources = request.ref_name().map(|ref_name| RunResources {
            repositories: RepositoryResources {
                self_repo: RepositoryRef { ref_name },
            },
        });

        Self {
            variables,
            resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_are_wrapped_in_value_objects() {
        let request = RunRequest::new()
            .with_variable("a", "1")
            .with_variable("b", "2");

        let body = serde_json::to_value(RunPipelineRequest::from(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "variables": {
                    "a": { "value": "1" },
                    "b": { "value": "2" }
                }
            })
        );
    }

    #[test]
    fn test_empty_variables_still_sent() {
        let body = serde_json::to_value(RunPipelineRequest::from(&RunRequest::new())).unwrap();
        assert_eq!(body, serde_json::json!({ "variables": {} }));
    }

    #[test]
    fn test_branch_becomes_self_repository_ref() {
        let request = RunRequest::new().with_branch("release/1.0");

        let body = serde_json::to_value(RunPipelineRequest::from(&request)).unwrap();
        assert_eq!(
            body["resources"]["repositories"]["self"]["refName"],
            "refs/heads/release/1.0"
        );
    }

    #[test]
    fn test_deserialize_pipeline_without_links() {
        let pipeline: AzurePipeline =
            serde_json::from_value(serde_json::json!({ "id": 5, "name": "Nightly" })).unwrap();
        assert_eq!(pipeline.id, 5);
        assert_eq!(web_href(pipeline.links.as_ref()), "");
    }

    #[test]
    fn test_deserialize_run() {
        let run: AzureRun = serde_json::from_value(serde_json::json!({
            "id": 123,
            "name": "20240101.1",
            "state": "inProgress",
            "createdDate": "2024-01-01T00:00:00Z",
            "pipeline": { "id": 2, "name": "Deploy", "folder": "\\" },
            "_links": { "web": { "href": "https://dev.azure.com/o/p/_build/results?buildId=123" } }
        }))
        .unwrap();

        assert_eq!(run.state, "inProgress");
        assert!(run.result.is_none());
        assert_eq!(run.pipeline.unwrap().id, 2);
        assert!(web_href(run.links.as_ref()).ends_with("buildId=123"));
    }
}
