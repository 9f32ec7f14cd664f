//! Configuration file handling.
//!
//! The configuration file is stored at `$EXPENSES_HOME/config.json`. It names the SQLite file and
//! holds report defaults.

use crate::auth::{AuthContext, Authenticator, TokenAuthenticator};
use crate::db::Db;
use crate::engine::{Engine, DEFAULT_TOP_N};
use crate::error::{ErrorType, PubError};
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "expenses";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const EXPENSES_SQLITE: &str = "expenses.sqlite";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$EXPENSES_HOME` and from there it loads `$EXPENSES_HOME/config.json`. Loading a
/// config also opens the database, so a `Config` hands out a ready `Engine`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    engine: Engine,
    sqlite_path: PathBuf,
}

impl Config {
    /// Creates the home directory, an initial `config.json` and an empty database.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/expenses`
    /// - `top_n` - The default number of entries in a report's top categories
    ///
    /// # Errors
    /// - Returns an error if any file operations fail or if a database already exists.
    pub async fn create(dir: impl Into<PathBuf>, top_n: usize) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the expenses home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!(
                "A config file already exists at '{}'",
                config_path.display()
            );
        }
        let config_file = ConfigFile {
            top_n,
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        let sqlite_path = config_file.sqlite_path(&root);
        let db = Db::init(&sqlite_path)
            .await
            .context("Unable to create SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            engine: Engine::new(db),
            sqlite_path,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load the config file
    /// - open the database and bring its schema up to date
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The expenses home directory is missing, did you run init?")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let sqlite_path = config_file.sqlite_path(&root);
        let db = Db::load(&sqlite_path)
            .await
            .context("Unable to load SQLite DB")?;

        Ok(Self {
            root,
            config_path,
            config_file,
            engine: Engine::new(db),
            sqlite_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn sqlite_path(&self) -> &Path {
        &self.sqlite_path
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The default length of a report's top categories list.
    pub fn top_n(&self) -> usize {
        self.config_file.top_n
    }

    pub fn authenticator(&self) -> TokenAuthenticator {
        TokenAuthenticator::new(self.engine.db().clone())
    }

    /// Resolves the bearer `token` into an `AuthContext`. A missing token is `Unauthorized`.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AuthContext> {
        let Some(token) = token else {
            return Err(PubError::new(
                ErrorType::Unauthorized,
                "A token is required, pass --token or set EXPENSES_TOKEN",
            )
            .into());
        };
        self.authenticator().authenticate(token).await
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "expenses",
///   "config_version": 1,
///   "top_n": 5,
///   "sqlite_path": "data/expenses.sqlite"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "expenses"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Number of categories in a report's top categories list
    #[serde(default = "default_top_n")]
    top_n: usize,

    /// Path to the SQLite file (optional, relative to the home directory or absolute).
    /// Defaults to $EXPENSES_HOME/expenses.sqlite
    #[serde(skip_serializing_if = "Option::is_none")]
    sqlite_path: Option<PathBuf>,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            top_n: DEFAULT_TOP_N,
            sqlite_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from `path` and validates `app_name`.
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::read_json(path).await?;
        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {} in config file, expected {}",
            config.config_version,
            CONFIG_VERSION
        );
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        utils::write_json(path, self)
            .await
            .context("Unable to write config file")
    }

    /// Resolves the SQLite path against `root` if it is relative.
    fn sqlite_path(&self, root: &Path) -> PathBuf {
        match &self.sqlite_path {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => root.join(p),
            None => root.join(EXPENSES_SQLITE),
        }
    }
}
