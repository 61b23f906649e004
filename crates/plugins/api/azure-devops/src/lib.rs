//! Azure DevOps provider implementation for azdo-pipelines.
//!
//! This crate talks to the Azure DevOps Pipelines REST API: listing the
//! pipelines of a project and queueing runs.

mod client;
mod types;

pub use client::AzureDevOpsClient;
pub use types::*;

/// Provider name reported by [`AzureDevOpsClient`].
pub const PROVIDER_NAME: &str = "azure-devops";
