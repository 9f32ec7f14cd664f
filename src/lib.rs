//! Rule-based transaction categorization and expense reporting.
//!
//! Owners keep categories and map description substrings to them. Transactions are classified
//! with those mappings as they arrive, uncategorized ones are swept again whenever mappings are
//! added, and the summary report aggregates income and expenses by month and by category.

pub mod args;
pub mod auth;
pub mod commands;
mod config;
mod db;
pub mod engine;
mod error;
mod mcp;
pub mod model;
mod utils;


pub use config::Config;
pub use error::{find_pub_error, Detail, DetailItem, Error, ErrorType, PubError, Result};
