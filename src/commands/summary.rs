use crate::args::SummaryArgs;
use crate::auth::AuthContext;
use crate::commands::Out;
use crate::engine::{Report, ReportFilter, SweepReport};
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use tracing::debug;

/// Builds the summary report for the caller's transactions that pass the optional date range and
/// category filter.
pub async fn summary(config: Config, auth: &AuthContext, args: SummaryArgs) -> Result<Out<Report>> {
    let filter = ReportFilter::parse(args.start_date(), args.end_date(), args.category_id())?;
    let top_n = args.top_n().unwrap_or_else(|| config.top_n());
    debug!("Summary for owner {} with {filter:?}, top {top_n}", auth.owner_id());
    let report = config
        .engine()
        .report(auth, &filter, top_n)
        .await
        .pub_result(ErrorType::Storage)?;
    let message = match report.pie.month {
        Some(month) => format!(
            "Summary through {month}: income {}, expense {}",
            report.pie.total_income.pretty(),
            report.pie.total_expense.pretty()
        ),
        None => "No transactions match the filter".to_string(),
    };
    Ok(Out::new(message, report))
}

/// Re-checks every uncategorized transaction against the current mappings.
pub async fn sweep(config: Config, auth: &AuthContext) -> Result<Out<SweepReport>> {
    let report = config
        .engine()
        .sweep(auth)
        .await
        .pub_result(ErrorType::Storage)?;
    Ok(Out::new(
        format!(
            "Categorized {} of {} uncategorized transaction(s)",
            report.categorized, report.examined
        ),
        report,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::find_pub_error;
    use crate::test::TestEnv;

    fn args(start: Option<&str>, end: Option<&str>, category: Option<&str>) -> SummaryArgs {
        SummaryArgs::new(
            start.map(String::from),
            end.map(String::from),
            category.map(String::from),
            None,
        )
    }

    #[tokio::test]
    async fn test_summary_shape() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        let groceries = env.category("Groceries").await;
        env.engine()
            .add_rules(env.auth(), groceries.id, ["Walmart"])
            .await
            .unwrap();
        env.engine().wait_for_sweeps().await;
        env.ingest(account.id, "2024-03-01", "Paycheck", "3000").await;
        env.ingest(account.id, "2024-03-04", "WALMART 1", "-80.25").await;

        let out = summary(env.config(), env.auth(), SummaryArgs::default())
            .await
            .unwrap();
        let json = serde_json::to_value(out.structure().unwrap()).unwrap();
        assert_eq!(json["pie"]["month"], "2024-03");
        assert_eq!(json["top_categories"][0]["category"], "Groceries");
        assert!(json["bar"].is_array());
        assert!(json["line"].is_array());
    }

    #[tokio::test]
    async fn test_summary_bad_params_list_every_problem() {
        let env = TestEnv::new().await;
        let e = summary(
            env.config(),
            env.auth(),
            args(Some("2024-13-01"), Some("yesterday"), Some("abc")),
        )
        .await
        .unwrap_err();
        let p = find_pub_error(&e).unwrap();
        assert_eq!(p.status(), 400);
        assert_eq!(p.body()["detail"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sweep_command() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        let rent = env.category("Rent").await;
        env.transaction(account.id, "2024-03-01", "LANDLORD LLC", "-1200")
            .await;
        env.engine()
            .add_rules(env.auth(), rent.id, ["landlord"])
            .await
            .unwrap();
        env.engine().wait_for_sweeps().await;

        let out = sweep(env.config(), env.auth()).await.unwrap();
        assert_eq!(out.structure().unwrap().categorized, 0);
        assert_eq!(out.message(), "Categorized 0 of 0 uncategorized transaction(s)");
    }

    #[tokio::test]
    async fn test_summary_overflow_is_rejected() {
        let env = TestEnv::new().await;
        let account = env.account("Checking").await;
        let max = "-79228162514264337593543950335";
        env.transaction(account.id, "2024-03-01", "Huge", max).await;
        env.transaction(account.id, "2024-03-02", "Huge again", max)
            .await;

        let e = summary(env.config(), env.auth(), SummaryArgs::default())
            .await
            .unwrap_err();
        let p = find_pub_error(&e).unwrap();
        assert_eq!(p.error_type(), ErrorType::Validation);
    }
}
