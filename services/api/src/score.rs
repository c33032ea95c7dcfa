use crate::infra::{build_service, load_models};
use clap::Args;
use credit_scoring::config::AppConfig;
use credit_scoring::error::AppError;
use credit_scoring::scoring::{Decision, Product, ScoringService};
use credit_scoring::telemetry;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Product to score: mo, cc, ln or ca
    #[arg(value_parser = parse_product)]
    pub(crate) product: Product,
    /// JSON file holding the application
    pub(crate) input: PathBuf,
}

fn parse_product(raw: &str) -> Result<Product, String> {
    Product::from_slug(raw).ok_or_else(|| {
        let known: Vec<&str> = Product::ALL.iter().map(Product::slug).collect();
        format!("unknown product '{raw}' (expected one of {})", known.join(", "))
    })
}

/// Loads the configured models, scores one application file and prints the
/// decision as JSON.
pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;

    let service = build_service(&config.models);
    let report = load_models(&service, &config.models);
    info!(
        installed = report.installed,
        failed = report.failed,
        "models loaded for one-off scoring"
    );

    let raw = std::fs::read_to_string(&args.input)?;
    let decision = score_json(&service, args.product, &raw)?;
    let rendered = serde_json::to_string_pretty(&decision)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn score_json(
    service: &ScoringService,
    product: Product,
    raw: &str,
) -> Result<Decision, AppError> {
    let decision = match product {
        Product::Mortgage => service.score_mortgage(&parse(raw)?),
        Product::CreditCard => service.score_credit_card(&parse(raw)?),
        Product::PersonalLoan => service.score_personal_loan(&parse(raw)?),
        Product::CurrentAccount => service.score_current_account(&parse(raw)?),
    }?;
    Ok(decision)
}

fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, AppError> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tests::sample_model_paths;
    use credit_scoring::scoring::ScoringError;

    fn loaded_service() -> std::sync::Arc<ScoringService> {
        let paths = sample_model_paths();
        let service = build_service(&paths);
        load_models(&service, &paths);
        service
    }

    #[test]
    fn product_argument_accepts_slugs() {
        assert_eq!(parse_product("cc"), Ok(Product::CreditCard));
        let err = parse_product("auto").unwrap_err();
        assert!(err.contains("mo, cc, ln, ca"));
    }

    #[test]
    fn retiree_mortgage_is_scored_on_adjusted_income() {
        let decision = score_json(
            &loaded_service(),
            Product::Mortgage,
            r#"{"age": 61, "annual_income": 70000, "monthly_debt": 500,
                "property_price": 300000, "deposit_amount": 150000,
                "requested_loan": 150000, "mortgage_term_years": 10,
                "mortgage_term_months": 120}"#,
        )
        .expect("mortgage scores");

        assert_eq!(
            decision.policy_message.as_deref(),
            Some("Income adjusted for retirement")
        );
        assert!(decision.risk.is_some());
    }

    #[test]
    fn current_account_file_scores_without_amount() {
        let decision = score_json(
            &loaded_service(),
            Product::CurrentAccount,
            r#"{"age": 28, "annual_income": 42000, "avg_monthly_balance": -120}"#,
        )
        .expect("current account scores");

        assert!(decision.loan_amount.is_none());
        let total = decision.approval.prob_approved + decision.approval.prob_declined;
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_json_is_reported_as_parse_error() {
        let result = score_json(&loaded_service(), Product::PersonalLoan, "{not json");

        match result {
            Err(err @ AppError::Parse(_)) => assert!(err.to_string().starts_with("invalid json")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unloaded_product_is_not_ready() {
        let service = build_service(&sample_model_paths());

        let result = score_json(&service, Product::CreditCard, "{}");

        assert!(matches!(
            result,
            Err(AppError::Scoring(ScoringError::NotReady {
                product: Product::CreditCard
            }))
        ));
    }
}
