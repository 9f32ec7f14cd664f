use crate::args::{DeleteCategoryArgs, InsertCategoryArgs};
use crate::auth::AuthContext;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::{Category, CategoryDeletion};
use crate::{Config, Result};

/// Lists the owner's categories as `[{id, name}]`.
pub async fn list_categories(config: Config, auth: &AuthContext) -> Result<Out<Vec<Category>>> {
    let categories = config
        .engine()
        .list_categories(auth)
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!("Found {} categories", categories.len()),
        categories,
    ))
}

pub async fn insert_category(
    config: Config,
    auth: &AuthContext,
    args: InsertCategoryArgs,
) -> Result<Out<Category>> {
    let category = config
        .engine()
        .create_category(auth, args.name())
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!("Created category '{}' with id {}", category.name, category.id),
        category,
    ))
}

pub async fn delete_category(
    config: Config,
    auth: &AuthContext,
    args: DeleteCategoryArgs,
) -> Result<Out<CategoryDeletion>> {
    let deletion = config
        .engine()
        .delete_category(auth, args.id())
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!(
            "Deleted category '{}', removed {} mapping(s), {} transaction(s) are now uncategorized",
            deletion.category.name, deletion.rules_removed, deletion.transactions_uncategorized
        ),
        deletion,
    ))
}
