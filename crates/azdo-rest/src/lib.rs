//! REST front-end for Azure DevOps pipelines.
//!
//! | Method | Path             | Body                                     |
//! |--------|------------------|------------------------------------------|
//! | GET    | `/health`        |                                          |
//! | GET    | `/pipelines`     |                                          |
//! | POST   | `/pipelines/run` | `{pipelineName, variables?, branch?}`    |
//!
//! Every failure is answered with `{"error": "..."}`.

pub mod error;
pub mod health;
pub mod pipeline;

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use azdo_core::PipelineService;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult};

/// Create the API router with all endpoints
pub fn create_router(service: PipelineService) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/pipelines", get(pipeline::list_pipelines))
        .route("/pipelines/run", post(pipeline::run_pipeline))
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve the router until the process is stopped.
pub async fn serve(service: PipelineService, addr: SocketAddr) -> std::io::Result<()> {
    let app = create_router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use azdo_core::{Pipeline, PipelineProvider, PipelineRef, PipelineRun, RunRequest};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct StaticProvider;

    #[async_trait]
    impl PipelineProvider for StaticProvider {
        fn provider_name(&self) -> &'static str {
            "static"
        }

        async fn list_pipelines(&self) -> azdo_core::Result<Vec<Pipeline>> {
            Ok(vec![
                Pipeline {
                    id: 1,
                    name: "Build".to_string(),
                    folder: None,
                    revision: None,
                    web_url: "u1".to_string(),
                },
                Pipeline {
                    id: 2,
                    name: "Deploy".to_string(),
                    folder: None,
                    revision: None,
                    web_url: "u2".to_string(),
                },
            ])
        }

        async fn queue_run(
            &self,
            pipeline: &Pipeline,
            _request: &RunRequest,
        ) -> azdo_core::Result<PipelineRun> {
            Ok(PipelineRun {
                id: 9,
                name: "20240101.1".to_string(),
                status: "inProgress".to_string(),
                result: None,
                created_date: None,
                pipeline: PipelineRef {
                    id: pipeline.id,
                    name: pipeline.name.clone(),
                },
                web_url: "w".to_string(),
            })
        }
    }

    async fn send(method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let app = create_router(PipelineService::new(Arc::new(StaticProvider)));

        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health_route() {
        let (status, body) = send(Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_list_route() {
        let (status, body) = send(Method::GET, "/pipelines", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "pipelines": [
                    { "id": 1, "name": "Build", "url": "u1" },
                    { "id": 2, "name": "Deploy", "url": "u2" }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_run_route() {
        let (status, body) = send(
            Method::POST,
            "/pipelines/run",
            Some(json!({ "pipelineName": "Deploy", "variables": { "env": "prod" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "id": 9, "name": "Deploy", "status": "inProgress", "url": "w" })
        );
    }

    #[tokio::test]
    async fn test_run_route_errors() {
        let (status, body) = send(
            Method::POST,
            "/pipelines/run",
            Some(json!({ "pipelineName": "Nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Pipeline not found: Nope" }));

        let (status, body) = send(Method::POST, "/pipelines/run", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Pipeline name is required" }));

        let (status, body) = send(
            Method::POST,
            "/pipelines/run",
            Some(json!({ "pipelineName": "Deploy", "variables": { "a": 1 } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body: "));
    }

    #[tokio::test]
    async fn test_wrong_method_and_unknown_path() {
        let (status, _) = send(Method::GET, "/pipelines/run", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(Method::POST, "/pipelines", Some(json!({}))).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, _) = send(Method::GET, "/pipeline/list", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
