//! MCP server command handler.

use crate::auth::AuthContext;
use crate::commands::Out;
use crate::mcp::Io;
use crate::{mcp, Config, Result};

/// Runs the MCP server.
///
/// This launches a long-running process that communicates via JSON-RPC over stdin/stdout. MCP
/// clients launch this as a subprocess with the owner's token in `EXPENSES_TOKEN`.
pub async fn mcp(config: Config, auth: AuthContext) -> Result<Out<()>> {
    mcp::run_server(config, auth, Io::Stdio).await?;
    Ok("Done running MCP server".into())
}
