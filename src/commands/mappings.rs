use crate::args::AddMappingArgs;
use crate::auth::AuthContext;
use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::model::Mapping;
use crate::{Config, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lists one row per mapping: `[{category_id, category, substring}]`.
pub async fn list_mappings(config: Config, auth: &AuthContext) -> Result<Out<Vec<Mapping>>> {
    let mappings = config
        .engine()
        .list_mappings(auth)
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!("Found {} mapping(s)", mappings.len()),
        mappings,
    ))
}

/// The response to adding mappings.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MappingAdded {
    /// A human-readable summary of what happened.
    pub detail: String,
    /// The substrings that were mapped by this request.
    pub added: Vec<String>,
    /// The substrings that were already mapped and were left alone.
    pub skipped: Vec<String>,
}

/// Maps substrings to a category. Uncategorized transactions are re-checked in the background
/// once the mappings are stored.
pub async fn add_mapping(
    config: Config,
    auth: &AuthContext,
    args: AddMappingArgs,
) -> Result<Out<MappingAdded>> {
    let engine = config.engine();
    let outcome = engine
        .add_rules(auth, args.category_id(), args.substrings())
        .await
        .pub_result(ErrorType::Storage)?;

    let name = engine
        .category(auth, args.category_id())
        .await
        .pub_result(ErrorType::Storage)?
        .map(|c| c.name)
        .unwrap_or_else(|| args.category_id().to_string());

    let mut detail = format!(
        "Created {} mapping(s) for category '{name}'",
        outcome.added.len()
    );
    if !outcome.skipped.is_empty() {
        detail.push_str(&format!(
            ", skipped {} already mapped: {}",
            outcome.skipped.len(),
            outcome.skipped.join(", ")
        ));
    }

    let added = MappingAdded {
        detail: detail.clone(),
        added: outcome.added.into_iter().map(|r| r.pattern).collect(),
        skipped: outcome.skipped,
    };
    Ok(Out::new(detail, added))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::find_pub_error;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_add_then_list() {
        let env = TestEnv::new().await;
        let groceries = env.category("Groceries").await;
        let args = AddMappingArgs::new(groceries.id, vec!["Walmart, Costco".into()]);

        let out = add_mapping(env.config(), env.auth(), args.clone())
            .await
            .unwrap();
        assert_eq!(out.message(), "Created 2 mapping(s) for category 'Groceries'");

        let again = add_mapping(env.config(), env.auth(), args).await.unwrap();
        let again = again.structure().unwrap();
        assert!(again.added.is_empty());
        assert_eq!(again.skipped, vec!["Walmart", "Costco"]);

        let listed = list_mappings(env.config(), env.auth()).await.unwrap();
        let json = serde_json::to_value(listed.structure().unwrap()).unwrap();
        assert_eq!(json[0]["category"], "Groceries");
        assert_eq!(json[0]["substring"], "Walmart");
        assert_eq!(json[1]["substring"], "Costco");
        env.engine().wait_for_sweeps().await;
    }

    #[tokio::test]
    async fn test_validation_failures() {
        let env = TestEnv::new().await;
        let groceries = env.category("Groceries").await;

        let empty = AddMappingArgs::new(groceries.id, vec![" , ".into()]);
        let e = add_mapping(env.config(), env.auth(), empty)
            .await
            .unwrap_err();
        assert_eq!(find_pub_error(&e).unwrap().status(), 400);

        let unknown = AddMappingArgs::new(groceries.id + 100, vec!["Walmart".into()]);
        let e = add_mapping(env.config(), env.auth(), unknown)
            .await
            .unwrap_err();
        let p = find_pub_error(&e).unwrap();
        assert_eq!(p.status(), 404);
        assert_eq!(p.body()["detail"], "Category not found");
    }
}
