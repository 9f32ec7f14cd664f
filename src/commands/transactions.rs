use crate::args::{
    InsertAccountArgs, InsertTransactionArgs, TransactionsArgs, UpdateTransactionArgs,
};
use crate::auth::AuthContext;
use crate::commands::Out;
use crate::engine::ReportFilter;
use crate::error::{ErrorType, IntoResult, PubError};
use crate::model::{Account, NewTransaction, Transaction, UNCATEGORIZED};
use crate::{Config, Result};

/// Lists the owner's accounts as `[{id, name}]`.
pub async fn list_accounts(config: Config, auth: &AuthContext) -> Result<Out<Vec<Account>>> {
    let accounts = config
        .engine()
        .list_accounts(auth)
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!("Found {} account(s)", accounts.len()),
        accounts,
    ))
}

/// Lists the owner's transactions, oldest first, that pass the optional date range and category
/// filter. The filter behaves exactly as it does for the summary report: an inverted range or a
/// category of another owner yields an empty list.
pub async fn list_transactions(
    config: Config,
    auth: &AuthContext,
    args: TransactionsArgs,
) -> Result<Out<Vec<Transaction>>> {
    let filter = ReportFilter::parse(args.start_date(), args.end_date(), args.category_id())?;
    let transactions = config
        .engine()
        .transactions(auth, &filter)
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!("Found {} transaction(s)", transactions.len()),
        transactions,
    ))
}

pub async fn insert_account(
    config: Config,
    auth: &AuthContext,
    args: InsertAccountArgs,
) -> Result<Out<Account>> {
    let account = config
        .engine()
        .create_account(auth, args.name())
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!("Created account '{}' with id {}", account.name, account.id),
        account,
    ))
}

/// Stores a single transaction. It is classified against the current mappings as it lands.
pub async fn insert_transaction(
    config: Config,
    auth: &AuthContext,
    args: InsertTransactionArgs,
) -> Result<Out<Transaction>> {
    let new = NewTransaction {
        date: args.date(),
        description: args.description().to_string(),
        amount: args.amount(),
    };
    let mut inserted = config
        .engine()
        .ingest(auth, args.account_id(), vec![new])
        .await
        .pub_result(ErrorType::Storage)?;
    let Some(transaction) = inserted.pop() else {
        let e = PubError::new(ErrorType::Storage, "The insert returned no transaction");
        return Err(e.into());
    };
    let category = transaction
        .category
        .as_ref()
        .map(|c| c.name.as_str())
        .unwrap_or(UNCATEGORIZED);
    Ok(Out::new(
        format!(
            "Inserted transaction {} for {} as '{category}'",
            transaction.id,
            transaction.amount.pretty()
        ),
        transaction,
    ))
}

/// Sets or clears the category of one transaction by hand.
pub async fn update_transaction(
    config: Config,
    auth: &AuthContext,
    args: UpdateTransactionArgs,
) -> Result<Out<Transaction>> {
    let transaction = config
        .engine()
        .set_category(auth, args.id(), args.category_id())
        .await
        .pub_result(ErrorType::Storage)?;
    let message = match &transaction.category {
        Some(c) => format!("Transaction {} is now '{}'", transaction.id, c.name),
        None => format!("Transaction {} is now uncategorized", transaction.id),
    };
    Ok(Out::new(message, transaction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::find_pub_error;
    use crate::model::Amount;
    use crate::test::TestEnv;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_insert_is_classified() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        let groceries = env.category("Groceries").await;
        env.engine()
            .add_rules(env.auth(), groceries.id, ["Costco"])
            .await
            .unwrap();
        env.engine().wait_for_sweeps().await;

        let args = InsertTransactionArgs::new(
            account.id,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            "COSTCO #12",
            "-54.10".parse::<Amount>().unwrap(),
        );
        let out = insert_transaction(env.config(), env.auth(), args)
            .await
            .unwrap();
        let inserted = out.structure().unwrap();
        assert_eq!(inserted.category.as_ref().unwrap().id, groceries.id);
        assert_eq!(
            out.message(),
            format!("Inserted transaction {} for -$54.10 as 'Groceries'", inserted.id)
        );
    }

    #[tokio::test]
    async fn test_update_and_clear() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        let rent = env.category("Rent").await;
        let t = env
            .transaction(account.id, "2024-03-01", "Landlord", "-1200")
            .await;

        let out = update_transaction(
            env.config(),
            env.auth(),
            UpdateTransactionArgs::new(t.id, Some(rent.id)),
        )
        .await
        .unwrap();
        assert_eq!(out.structure().unwrap().category.as_ref().unwrap().id, rent.id);

        let args = UpdateTransactionArgs::new(t.id, None);
        let out = update_transaction(env.config(), env.auth(), args)
            .await
            .unwrap();
        assert!(out.structure().unwrap().category.is_none());
    }

    #[tokio::test]
    async fn test_insert_into_foreign_account() {
        let env = TestEnv::new().await;
        let other = env.other_owner().await;
        let theirs = env.engine().create_account(&other, "Savings").await.unwrap();
        let args = InsertTransactionArgs::new(
            theirs.id,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            "Anything",
            "1".parse::<Amount>().unwrap(),
        );
        let e = insert_transaction(env.config(), env.auth(), args)
            .await
            .unwrap_err();
        assert_eq!(find_pub_error(&e).unwrap().error_type(), ErrorType::NotFound);
    }

    #[tokio::test]
    async fn test_list_accounts_is_owner_scoped() {
        let env = TestEnv::new().await;
        let other = env.other_owner().await;
        env.account("Checking").await;
        env.engine().create_account(&other, "Savings").await.unwrap();

        let out = list_accounts(env.config(), env.auth()).await.unwrap();
        let json = serde_json::to_value(out.structure().unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["name"], "Checking");
        assert_eq!(out.message(), "Found 1 account(s)");
    }

    #[tokio::test]
    async fn test_list_transactions_filters() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        let rent = env.category("Rent").await;
        let paid = env
            .transaction(account.id, "2024-03-01", "Landlord", "-1200")
            .await;
        env.transaction(account.id, "2024-02-10", "Coffee", "-4.50")
            .await;
        env.transaction(account.id, "2024-04-02", "Paycheck", "3000")
            .await;
        env.engine()
            .set_category(env.auth(), paid.id, Some(rent.id))
            .await
            .unwrap();

        let all = list_transactions(env.config(), env.auth(), TransactionsArgs::default())
            .await
            .unwrap();
        assert_eq!(all.structure().unwrap().len(), 3);

        let march = TransactionsArgs::new(
            Some("2024-03-01".into()),
            Some("2024-03-31".into()),
            None,
        );
        let out = list_transactions(env.config(), env.auth(), march)
            .await
            .unwrap();
        let listed = out.structure().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, paid.id);

        let by_category = TransactionsArgs::new(None, None, Some(rent.id.to_string()));
        let out = list_transactions(env.config(), env.auth(), by_category)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap()[0].description, "Landlord");

        let inverted = TransactionsArgs::new(
            Some("2024-04-01".into()),
            Some("2024-03-01".into()),
            None,
        );
        let out = list_transactions(env.config(), env.auth(), inverted)
            .await
            .unwrap();
        assert!(out.structure().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_transactions_bad_date() {
        let env = TestEnv::new().await;
        let args = TransactionsArgs::new(Some("03/01/2024".into()), None, None);
        let e = list_transactions(env.config(), env.auth(), args)
            .await
            .unwrap_err();
        assert_eq!(find_pub_error(&e).unwrap().status(), 400);
    }
}
