//! Command handlers for the expenses CLI.
//!
//! Each handler takes the loaded `Config` and, except for the setup commands, the caller's
//! `AuthContext`. The same handlers back the MCP tools.

mod categories;
mod init;
mod mappings;
mod mcp;
mod summary;
mod transactions;

use serde::Serialize;
use std::fmt::Debug;
use tracing::{debug, info};

pub use categories::{delete_category, insert_category, list_categories};
pub use init::{add_owner, init, OwnerCreated};
pub use mappings::{add_mapping, list_mappings, MappingAdded};
pub use mcp::mcp;
pub use summary::{summary, sweep};
pub use transactions::{
    insert_account, insert_transaction, list_accounts, list_transactions, update_transaction,
};

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data to both the command line and MCP server interfaces.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Logs the message with `info!` and the structured data (if it exists) with `debug!`. The
    /// structured data is also written to stdout as JSON so that the output can be piped.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
                println!("{json}");
            }
        }
    }
}
