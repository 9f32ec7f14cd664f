//! MCP (Model Context Protocol) server implementation.
//!
//! Exposes the read and mapping operations as tools for an agent. The server is started with an
//! already authenticated owner and every tool call acts as that owner.

mod mcp_utils;
mod tools;

use crate::auth::AuthContext;
use crate::Config;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::transport::stdio;
use rmcp::{tool_handler, ServerHandler, ServiceExt};
use std::sync::Arc;
use tracing::info;

/// The expenses MCP server.
#[derive(Debug, Clone)]
pub struct ExpenseServer {
    config: Arc<Config>,
    auth: AuthContext,
    tool_router: ToolRouter<ExpenseServer>,
}

impl ExpenseServer {
    pub fn new(config: Config, auth: AuthContext) -> Self {
        Self {
            config: Arc::new(config),
            auth,
            tool_router: Self::tool_router(),
        }
    }

    fn config(&self) -> Config {
        (*self.config).clone()
    }
}

#[tool_handler]
impl ServerHandler for ExpenseServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "expenses".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(include_str!("docs/INTRO.md").into()),
        }
    }
}

/// Transport type for the MCP server.
#[derive(Debug, Default)]
pub(crate) enum Io {
    #[default]
    Stdio,
    /// Mock transport for testing - holds one end of a duplex channel.
    #[cfg(test)]
    Mock(tokio::io::DuplexStream),
}

/// Runs the MCP server until the client disconnects or an error occurs. Background sweeps started
/// by tool calls are awaited before returning.
pub(crate) async fn run_server(config: Config, auth: AuthContext, io: Io) -> crate::Result<()> {
    use crate::error::{ErrorType, IntoResult};
    let engine = config.engine().clone();
    let server = ExpenseServer::new(config, auth);
    info!("Starting MCP server...");

    let service = match io {
        Io::Stdio => server
            .serve(stdio())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))
            .pub_result(ErrorType::Config)?,
        #[cfg(test)]
        Io::Mock(stream) => server
            .serve(stream)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start MCP server: {e}"))
            .pub_result(ErrorType::Config)?,
    };

    info!("MCP server running, waiting for requests...");

    let waited = service
        .waiting()
        .await
        .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))
        .pub_result(ErrorType::Config);
    engine.wait_for_sweeps().await;
    waited?;

    info!("MCP server shut down");
    Ok(())
}
