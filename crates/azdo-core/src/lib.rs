//! Core traits, types, and error handling for azdo-pipelines.
//!
//! This crate provides the foundational abstractions shared by the Azure DevOps
//! client and both front-ends (REST and MCP).

pub mod config;
pub mod error;
pub mod provider;
pub mod service;
pub mod types;

pub use error::{Error, Result, Stage};
pub use provider::PipelineProvider;
pub use service::{find_by_name, PipelineService};
pub use types::{Pipeline, PipelineRef, PipelineRun, RunRequest};
