use crate::args::OwnerAddArgs;
use crate::commands::Out;
use crate::error::{validation, ErrorType, IntoResult};
use crate::model::OwnerId;
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// Creates the home directory, an initial `config.json` and an empty database.
///
/// # Arguments
/// - `home` - The directory that will be the root of the data directory, e.g. `$HOME/expenses`
/// - `top_n` - The default length of the summary's top categories list
///
/// # Errors
/// - Returns an error if any file operations fail or the directory is already initialized.
pub async fn init(home: &Path, top_n: usize) -> Result<Out<()>> {
    let config = Config::create(home, top_n)
        .await
        .context("Unable to create the data directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the expenses directory at '{}'",
        config.root().display()
    )
    .into())
}

/// The credential issued to a new owner.
#[derive(Debug, Clone, Serialize)]
pub struct OwnerCreated {
    pub id: OwnerId,
    pub name: String,
    pub token: String,
}

/// Registers an owner and issues an opaque token for them. Pass the token with `--token` or
/// `EXPENSES_TOKEN` to act as this owner.
pub async fn add_owner(config: Config, args: OwnerAddArgs) -> Result<Out<OwnerCreated>> {
    let name = args.name().trim();
    if name.is_empty() {
        return Err(validation("Owner name must not be empty"));
    }
    let token = Uuid::new_v4().to_string();
    let id = config
        .engine()
        .db()
        .insert_owner(name, &token)
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!("Created owner '{name}', keep the token somewhere safe"),
        OwnerCreated {
            id,
            name: name.to_string(),
            token,
        },
    ))
}
