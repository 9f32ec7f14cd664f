//! The tools exposed by the MCP server.

use crate::args::{AddMappingArgs, SummaryArgs, TransactionsArgs};
use crate::commands;
use crate::mcp::mcp_utils::tool_result;
use crate::mcp::ExpenseServer;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;
use rmcp::{tool, tool_router};
use tracing::info;

#[tool_router(vis = "pub(super)")]
impl ExpenseServer {
    /// List the owner's categories as `[{id, name}]`, ordered by name. Use the `id` when adding
    /// mappings or filtering the summary.
    #[tool]
    async fn list_categories(&self) -> Result<CallToolResult, McpError> {
        info!("MCP: list_categories called");
        let out = commands::list_categories(self.config(), &self.auth).await;
        tool_result(out)
    }

    /// List every substring mapping as `[{category_id, category, substring}]`, ordered by
    /// category name and then by the order the substrings were added.
    #[tool]
    async fn list_mappings(&self) -> Result<CallToolResult, McpError> {
        info!("MCP: list_mappings called");
        let out = commands::list_mappings(self.config(), &self.auth).await;
        tool_result(out)
    }

    /// List the owner's accounts as `[{id, name}]`, ordered by name.
    #[tool]
    async fn list_accounts(&self) -> Result<CallToolResult, McpError> {
        info!("MCP: list_accounts called");
        let out = commands::list_accounts(self.config(), &self.auth).await;
        tool_result(out)
    }

    /// List the owner's transactions, oldest first, as
    /// `[{id, account_id, date, description, amount, category}]`. `category` is `null` for an
    /// uncategorized transaction.
    ///
    /// All parameters are optional and behave as they do for `summary`: `start_date` and
    /// `end_date` are inclusive `YYYY-MM-DD` dates and `category_id` keeps one category.
    #[tool]
    async fn list_transactions(
        &self,
        Parameters(args): Parameters<TransactionsArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: list_transactions called");
        let out = commands::list_transactions(self.config(), &self.auth, args).await;
        tool_result(out)
    }

    /// Map one or more substrings to a category.
    ///
    /// Each entry of `substrings` may hold several comma-separated substrings. Whitespace is
    /// trimmed and empty pieces are dropped. Substrings that are already mapped (to any category,
    /// ignoring case) are returned under `skipped` and left unchanged.
    ///
    /// Once stored, uncategorized transactions are re-checked in the background. Transactions
    /// that already have a category keep it.
    ///
    /// # Example
    ///
    /// ```json
    /// {
    ///   "category_id": 3,
    ///   "substrings": ["Walmart, Costco", "Trader Joe"]
    /// }
    /// ```
    #[tool]
    async fn add_mapping(
        &self,
        Parameters(args): Parameters<AddMappingArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: add_mapping called for category {}", args.category_id());
        let out = commands::add_mapping(self.config(), &self.auth, args).await;
        tool_result(out)
    }

    /// Build the summary report: `pie` (income and expense of the latest month), `bar` (expense
    /// per category), `line` (income and expense per month, oldest first) and `top_categories`
    /// (highest expense first).
    ///
    /// All parameters are optional. `start_date` and `end_date` are inclusive `YYYY-MM-DD` dates.
    /// An end date before the start date yields an empty report. `top_n` defaults to the
    /// configured value.
    #[tool]
    async fn summary(
        &self,
        Parameters(args): Parameters<SummaryArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!("MCP: summary called");
        let out = commands::summary(self.config(), &self.auth, args).await;
        tool_result(out)
    }
}
