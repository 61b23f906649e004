//! Common types shared by the client and front-ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A pipeline definition in Azure DevOps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    /// Browser URL; empty when the service returned no web link
    #[serde(default)]
    pub web_url: String,
}

/// Minimal reference to the pipeline a run belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRef {
    pub id: u64,
    pub name: String,
}

/// A single run created by triggering a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: u64,
    /// Run name as assigned by the service (e.g. `20240101.1`)
    pub name: String,
    /// Remote `state` (`inProgress`, `completed`, ...)
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    pub pipeline: PipelineRef,
    #[serde(default)]
    pub web_url: String,
}

/// Input for triggering a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Run-time variables, sent upstream as `{key: {value}}`
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Branch to build; bare names are expanded to `refs/heads/<name>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl RunRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Fully-qualified ref for the requested branch, if any.
    pub fn ref_name(&self) -> Option<String> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(|b| {
                if b.starts_with("refs/") {
                    b.to_string()
                } else {
                    format!("refs/heads/{}", b)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_serializes_camel_case() {
        let pipeline = Pipeline {
            id: 7,
            name: "Build".to_string(),
            folder: None,
            revision: Some(3),
            web_url: "https://dev.azure.com/org/proj/_build?definitionId=7".to_string(),
        };

        let json = serde_json::to_value(&pipeline).unwrap();
        assert_eq!(json["webUrl"], pipeline.web_url.as_str());
        assert_eq!(json["revision"], 3);
        assert!(json.get("folder").is_none());
    }

    #[test]
    fn test_ref_name() {
        assert_eq!(RunRequest::new().ref_name(), None);
        assert_eq!(
            RunRequest::new().with_branch("main").ref_name(),
            Some("refs/heads/main".to_string())
        );
        assert_eq!(
            RunRequest::new().with_branch("refs/tags/v1").ref_name(),
            Some("refs/tags/v1".to_string())
        );
        assert_eq!(RunRequest::new().with_branch("  ").ref_name(), None);
    }

    #[test]
    fn test_run_request_defaults_from_json() {
        let req: RunRequest = serde_json::from_str("{}").unwrap();
        assert!(req.variables.is_empty());
        assert!(req.branch.is_none());
    }
}
