//! End-to-end scoring scenarios driven through the public service facade and
//! HTTP router, using fixed-output predictors in place of trained models.

mod common {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use credit_scoring::scoring::{
        BinaryPrediction, FeatureRow, ModelRole, MultiClassPrediction, PolicyConfig, Predictor,
        PredictorError, Product, ScoringService,
    };

    /// Scores every row the same way and counts invocations.
    pub(super) struct FixedModel {
        approval: [f64; 2],
        amount: f64,
        risk: Vec<f64>,
        pub(super) calls: AtomicUsize,
    }

    impl FixedModel {
        pub(super) fn new(approval: [f64; 2], amount: f64) -> Arc<Self> {
            Arc::new(Self {
                approval,
                amount,
                risk: vec![0.2, 0.5, 0.3],
                calls: AtomicUsize::new(0),
            })
        }

        pub(super) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Predictor for FixedModel {
        fn predict_binary(&self, _row: &FeatureRow) -> Result<BinaryPrediction, PredictorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let label = if self.approval[1] >= 0.5 {
                "Approved"
            } else {
                "Declined"
            };
            Ok(BinaryPrediction {
                label: label.to_string(),
                class_probabilities: self.approval,
            })
        }

        fn predict_regression(&self, _row: &FeatureRow) -> Result<f64, PredictorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.amount)
        }

        fn predict_multi_class(
            &self,
            _row: &FeatureRow,
        ) -> Result<MultiClassPrediction, PredictorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MultiClassPrediction {
                label: "Medium".to_string(),
                class_probabilities: self.risk.clone(),
            })
        }

        fn class_domain(&self) -> Vec<String> {
            vec!["Low".to_string(), "Medium".to_string(), "High".to_string()]
        }
    }

    pub(super) fn loaded_service(model: &Arc<FixedModel>) -> ScoringService {
        let service = ScoringService::new(PolicyConfig::default(), true);
        for product in Product::ALL {
            for role in service.descriptor(product).required_roles() {
                let predictor: Arc<dyn Predictor> = model.clone();
                service
                    .install(product, role, predictor)
                    .expect("model installs");
            }
        }
        assert!(service.descriptor(Product::Mortgage).required_roles().contains(&ModelRole::Risk));
        service
    }
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use credit_scoring::scoring::{
    scoring_router, CurrentAccountApplication, MortgageApplication, PolicyConfig, Product,
    ScoringError, ScoringService,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{loaded_service, FixedModel};

async fn post(router: axum::Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn eligible_mortgage_flows_through_every_model() {
    let model = FixedModel::new([0.25, 0.75], 245_000.0);
    let router = scoring_router(Arc::new(loaded_service(&model)));

    let (status, body) = post(
        router,
        "/api/score/mo",
        json!({
            "age": 30,
            "annual_income": 60000,
            "monthly_debt": 1500,
            "property_price": 300000,
            "deposit_amount": 50000,
            "requested_loan": 250000,
            "mortgage_term_years": 30,
            "mortgage_term_months": 360
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approval"]["label"], "Approved");
    assert_eq!(body["approval"]["prob_approved"], 0.75);
    assert_eq!(body["loanAmount"]["predicted_amount"], 245000.0);
    assert_eq!(body["risk"]["label"], "Medium");
    assert_eq!(
        body["risk"]["classProbabilities"],
        json!({"Low": 0.2, "Medium": 0.5, "High": 0.3})
    );
    assert_eq!(body["policy_message"], "Eligible under policy rules");
    assert_eq!(model.calls(), 3);
}

#[tokio::test]
async fn declined_mortgage_never_reaches_models() {
    let model = FixedModel::new([0.25, 0.75], 245_000.0);
    let router = scoring_router(Arc::new(loaded_service(&model)));

    let (status, body) = post(
        router,
        "/api/score/mo",
        json!({
            "age": 52,
            "annual_income": 80000,
            "monthly_debt": 500,
            "property_price": 400000,
            "deposit_amount": 100000,
            "requested_loan": 300000,
            "mortgage_term_years": 30,
            "mortgage_term_months": 360
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "approval": {"label": "Declined", "prob_approved": 0.0, "prob_declined": 1.0},
            "loanAmount": {"predicted_amount": 0.0},
            "policy_message": "Loan term too long for applicant age. Maximum allowed: 23 years"
        })
    );
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn unloaded_service_answers_unavailable_and_reports_down() {
    let service = Arc::new(ScoringService::new(PolicyConfig::default(), false));

    let (status, body) = post(
        scoring_router(Arc::clone(&service)),
        "/api/score/ca",
        json!({ "age": 25 }),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Models not loaded");

    let response = scoring_router(service)
        .oneshot(
            Request::get("/api/health")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");
    let bytes = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    let health: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(health["status"], "DOWN");
    assert_eq!(health["reason"], "Models not loaded");
}

#[test]
fn facade_scores_without_http() {
    let model = FixedModel::new([0.6, 0.4], 0.0);
    let service = loaded_service(&model);

    let decision = service
        .score_current_account(&CurrentAccountApplication {
            age: Some(22),
            annual_income: Some(18_000.0),
            avg_monthly_balance: Some(-150.0),
            ..Default::default()
        })
        .expect("current account scores");

    assert_eq!(decision.approval.label, "Declined");
    assert!(decision.loan_amount.is_none());
    assert!(matches!(
        service.score_mortgage(&MortgageApplication::default()),
        Err(ScoringError::InvalidInput(_))
    ));
    assert!(service.readiness().is_up());
    assert!(service.is_ready(Product::PersonalLoan));
}
