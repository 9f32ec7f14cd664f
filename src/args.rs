//! These structs provide the CLI interface for the expenses CLI.
//!
//! Argument structs that are also accepted by MCP tools derive `Deserialize` and `JsonSchema` so
//! that one type describes both surfaces.

use crate::engine::DEFAULT_TOP_N;
use crate::model::{AccountId, Amount, CategoryId, TransactionId};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expenses: rule-based categorization and reporting for your transactions.
///
/// Create categories, map substrings of transaction descriptions to them, and every transaction
/// that is ingested (or was ingested earlier and is still uncategorized) is filed automatically.
/// The summary command reports income, expenses and the top spending categories.
///
/// An AI agent can use this program through the mcp subcommand.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory, the configuration file and an empty database.
    ///
    /// Run this first. By default the home directory is $HOME/expenses; pass --home or set
    /// EXPENSES_HOME to put it somewhere else.
    Init(InitArgs),
    /// Manage owners. Every other command acts on behalf of the owner whose token is given.
    #[command(subcommand)]
    Owner(OwnerSubcommand),
    /// List your categories.
    Categories,
    /// List or add substring mappings (rules).
    #[command(subcommand)]
    Mappings(MappingsSubcommand),
    /// Insert an account, category or transaction.
    #[command(subcommand)]
    Insert(InsertSubcommand),
    /// Delete a category. Its mappings are removed and its transactions become uncategorized.
    #[command(subcommand)]
    Delete(DeleteSubcommand),
    /// Change the category of a transaction by hand.
    #[command(subcommand)]
    Update(UpdateSubcommand),
    /// List your accounts.
    Accounts,
    /// List your transactions, optionally filtered by date range and category.
    Transactions(TransactionsArgs),
    /// Print the summary report.
    Summary(SummaryArgs),
    /// Apply all mappings to transactions that are still uncategorized.
    Sweep,
    /// Run an MCP server over stdio for the authenticated owner.
    Mcp,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where data and configuration is held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_home())]
    home: DisplayPath,

    /// The owner's token, as printed by `owner add`.
    #[arg(long, env = "EXPENSES_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf, token: Option<String>) -> Self {
        Self {
            log_level,
            home: home.into(),
            token,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Args for the `expenses init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// How many categories the summary's top categories list holds by default.
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,
}

impl InitArgs {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum OwnerSubcommand {
    /// Register an owner and print their token.
    Add(OwnerAddArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct OwnerAddArgs {
    #[arg(long)]
    name: String,
}

impl OwnerAddArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum MappingsSubcommand {
    /// List every substring and the category it maps to.
    List,
    /// Map substrings to a category.
    Add(AddMappingArgs),
}

/// Maps one or more substrings to a category. Each entry may itself hold several substrings
/// separated by commas. A substring that is already mapped, to any category, is skipped.
#[derive(Debug, Clone, Parser, Serialize, Deserialize, JsonSchema)]
pub struct AddMappingArgs {
    /// The category the substrings map to.
    #[arg(long)]
    category_id: CategoryId,

    /// The substrings, e.g. `--substrings Walmart,Costco`. Matching ignores case.
    #[arg(long, required = true, num_args = 1..)]
    substrings: Vec<String>,
}

impl AddMappingArgs {
    pub fn new(category_id: CategoryId, substrings: Vec<String>) -> Self {
        Self {
            category_id,
            substrings,
        }
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn substrings(&self) -> &[String] {
        &self.substrings
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum InsertSubcommand {
    /// Create an account that transactions can be inserted into.
    Account(InsertAccountArgs),
    /// Create a category.
    Category(InsertCategoryArgs),
    /// Insert a transaction. It is categorized with the mappings that exist right now.
    Transaction(InsertTransactionArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct InsertAccountArgs {
    #[arg(long)]
    name: String,
}

impl InsertAccountArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Parser, Clone)]
pub struct InsertCategoryArgs {
    /// The category name. Must be unique ignoring case, and cannot be "Uncategorized".
    #[arg(long)]
    name: String,
}

impl InsertCategoryArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Parser, Clone)]
pub struct InsertTransactionArgs {
    #[arg(long)]
    account_id: AccountId,

    /// YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,

    #[arg(long)]
    description: String,

    /// Positive for income, negative for an expense, e.g. -45.20
    #[arg(long, allow_hyphen_values = true)]
    amount: Amount,
}

impl InsertTransactionArgs {
    pub fn new(
        account_id: AccountId,
        date: NaiveDate,
        description: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            account_id,
            date,
            description: description.into(),
            amount,
        }
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum DeleteSubcommand {
    Category(DeleteCategoryArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct DeleteCategoryArgs {
    /// The id of the category to delete.
    id: CategoryId,
}

impl DeleteCategoryArgs {
    pub fn new(id: CategoryId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> CategoryId {
        self.id
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UpdateSubcommand {
    Transaction(UpdateTransactionArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct UpdateTransactionArgs {
    /// The id of the transaction.
    id: TransactionId,

    /// Set this category. A transaction categorized by hand is never changed by a sweep.
    #[arg(long, conflicts_with = "clear_category", required_unless_present = "clear_category")]
    category_id: Option<CategoryId>,

    /// Remove the category so that mappings can categorize the transaction again.
    #[arg(long)]
    clear_category: bool,
}

impl UpdateTransactionArgs {
    pub fn new(id: TransactionId, category_id: Option<CategoryId>) -> Self {
        Self {
            id,
            clear_category: category_id.is_none(),
            category_id,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// The new category, `None` to clear it.
    pub fn category_id(&self) -> Option<CategoryId> {
        if self.clear_category {
            None
        } else {
            self.category_id
        }
    }
}

/// Filters for listing transactions. The values are request strings; they are validated when the
/// list is built, in the same way as the summary report's filters.
#[derive(Debug, Clone, Default, Parser, Serialize, Deserialize, JsonSchema)]
pub struct TransactionsArgs {
    /// Only transactions on or after this date, YYYY-MM-DD.
    #[arg(long)]
    #[serde(default)]
    start_date: Option<String>,

    /// Only transactions on or before this date, YYYY-MM-DD.
    #[arg(long)]
    #[serde(default)]
    end_date: Option<String>,

    /// Only transactions in this category.
    #[arg(long)]
    #[serde(default)]
    category_id: Option<String>,
}

impl TransactionsArgs {
    pub fn new(
        start_date: Option<String>,
        end_date: Option<String>,
        category_id: Option<String>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            category_id,
        }
    }

    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }
}

/// Parameters of the summary report. The values are request strings; they are validated when the
/// report is built.
#[derive(Debug, Clone, Default, Parser, Serialize, Deserialize, JsonSchema)]
pub struct SummaryArgs {
    /// Only transactions on or after this date, YYYY-MM-DD.
    #[arg(long)]
    #[serde(default)]
    start_date: Option<String>,

    /// Only transactions on or before this date, YYYY-MM-DD.
    #[arg(long)]
    #[serde(default)]
    end_date: Option<String>,

    /// Only transactions in this category.
    #[arg(long)]
    #[serde(default)]
    category_id: Option<String>,

    /// How many categories to list under top_categories. Defaults to the configured value.
    #[arg(long)]
    #[serde(default)]
    top_n: Option<usize>,
}

impl SummaryArgs {
    pub fn new(
        start_date: Option<String>,
        end_date: Option<String>,
        category_id: Option<String>,
        top_n: Option<usize>,
    ) -> Self {
        Self {
            start_date,
            end_date,
            category_id,
            top_n,
        }
    }

    pub fn start_date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }

    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }

    pub fn top_n(&self) -> Option<usize> {
        self.top_n
    }
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or EXPENSES_HOME instead of relying on the default \
                home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
