//! MCP (Model Context Protocol) server for azdo-pipelines.
//!
//! Exposes two tools over stdio: `list_pipelines` and `trigger_pipeline`.

pub mod handlers;
pub mod protocol;
pub mod server;
pub mod transport;

pub use handlers::ToolHandler;
pub use server::McpServer;
pub use transport::StdioTransport;
