//! Shared helpers for end-to-end tests against a mocked Azure DevOps.

use std::sync::Arc;

use azdo_azure::AzureDevOpsClient;
use azdo_core::PipelineService;
use httpmock::prelude::*;

/// `base64(":test-token")`
pub const AUTH_HEADER: &str = "Basic OnRlc3QtdG9rZW4=";

pub const PIPELINES_PATH: &str = "/org/proj/_apis/pipelines";

/// Service wired to a real client pointed at `server`.
pub fn service_for(server: &MockServer) -> PipelineService {
    let client = AzureDevOpsClient::with_base_url(server.base_url(), "org", "proj", "test-token");
    PipelineService::new(Arc::new(client))
}

/// Azure response listing `Build` (id 1) and `Deploy` (id 2).
pub fn pipelines_json() -> serde_json::Value {
    serde_json::json!({
        "count": 2,
        "value": [
            {
                "id": 1,
                "name": "Build",
                "folder": "\\",
                "revision": 1,
                "_links": { "web": { "href": "https://dev.azure.com/org/proj/_build/definition?definitionId=1" } }
            },
            {
                "id": 2,
                "name": "Deploy",
                "folder": "\\",
                "revision": 4,
                "_links": { "web": { "href": "https://dev.azure.com/org/proj/_build/definition?definitionId=2" } }
            }
        ]
    })
}

/// Azure response for a queued run of `Deploy`.
pub fn run_json() -> serde_json::Value {
    serde_json::json!({
        "id": 555,
        "name": "20240101.3",
        "state": "inProgress",
        "createdDate": "2024-01-01T10:00:00Z",
        "pipeline": { "id": 2, "name": "Deploy" },
        "_links": { "web": { "href": "https://dev.azure.com/org/proj/_build/results?buildId=555" } }
    })
}

/// Mock `GET _apis/pipelines` returning [`pipelines_json`].
pub fn mock_list(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET)
            .path(PIPELINES_PATH)
            .query_param("api-version", "7.1")
            .header("authorization", AUTH_HEADER);
        then.status(200).json_body(pipelines_json());
    })
}
