use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::scoring::domain::{
    CreditCardApplication, CurrentAccountApplication, FeatureRow, MortgageApplication,
    PersonalLoanApplication, Product,
};
use crate::scoring::pipeline::{ProductDescriptor, ScoringPipeline};
use crate::scoring::policy::{PolicyConfig, PolicyEvaluator, PolicyTerms};
use crate::scoring::predictor::{
    BinaryPrediction, ModelRole, MultiClassPrediction, Predictor, PredictorError,
};
use crate::scoring::service::ScoringService;

/// Predictor double returning canned outputs while counting calls and
/// capturing every feature row it receives.
#[derive(Default)]
pub(super) struct RecordingPredictor {
    binary: Option<BinaryPrediction>,
    regression: Option<f64>,
    multi_class: Option<MultiClassPrediction>,
    domain: Vec<String>,
    failure: Option<PredictorError>,
    calls: AtomicUsize,
    rows: Mutex<Vec<FeatureRow>>,
}

impl RecordingPredictor {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn rows(&self) -> Vec<FeatureRow> {
        self.rows.lock().expect("rows mutex poisoned").clone()
    }

    fn record<T: Clone>(
        &self,
        row: &FeatureRow,
        output: &Option<T>,
        kind: &'static str,
    ) -> Result<T, PredictorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rows
            .lock()
            .expect("rows mutex poisoned")
            .push(row.clone());
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        output.clone().ok_or(PredictorError::Unsupported(kind))
    }
}

impl Predictor for RecordingPredictor {
    fn predict_binary(&self, row: &FeatureRow) -> Result<BinaryPrediction, PredictorError> {
        self.record(row, &self.binary, "binary")
    }

    fn predict_regression(&self, row: &FeatureRow) -> Result<f64, PredictorError> {
        self.record(row, &self.regression, "regression")
    }

    fn predict_multi_class(
        &self,
        row: &FeatureRow,
    ) -> Result<MultiClassPrediction, PredictorError> {
        self.record(row, &self.multi_class, "multi-class")
    }

    fn class_domain(&self) -> Vec<String> {
        self.domain.clone()
    }
}

pub(super) fn approval_model(label: &str, probabilities: [f64; 2]) -> Arc<RecordingPredictor> {
    Arc::new(RecordingPredictor {
        binary: Some(BinaryPrediction {
            label: label.to_string(),
            class_probabilities: probabilities,
        }),
        ..RecordingPredictor::default()
    })
}

pub(super) fn amount_model(value: f64) -> Arc<RecordingPredictor> {
    Arc::new(RecordingPredictor {
        regression: Some(value),
        ..RecordingPredictor::default()
    })
}

pub(super) fn risk_model(label: &str, probabilities: Vec<f64>) -> Arc<RecordingPredictor> {
    Arc::new(RecordingPredictor {
        multi_class: Some(MultiClassPrediction {
            label: label.to_string(),
            class_probabilities: probabilities,
        }),
        domain: risk_domain(),
        ..RecordingPredictor::default()
    })
}

pub(super) fn failing_model(message: &str) -> Arc<RecordingPredictor> {
    Arc::new(RecordingPredictor {
        failure: Some(PredictorError::Internal(message.to_string())),
        ..RecordingPredictor::default()
    })
}

pub(super) fn risk_domain() -> Vec<String> {
    ["Low", "Medium", "High"]
        .iter()
        .map(|label| label.to_string())
        .collect()
}

/// Models installed into a pipeline, kept so tests can inspect call counts.
pub(super) struct InstalledModels {
    pub(super) approval: Arc<RecordingPredictor>,
    pub(super) amount: Arc<RecordingPredictor>,
    pub(super) risk: Arc<RecordingPredictor>,
}

impl InstalledModels {
    pub(super) fn standard() -> Self {
        Self {
            approval: approval_model("Approved", [0.3, 0.7]),
            amount: amount_model(250_000.0),
            risk: risk_model("Low", vec![0.7, 0.2, 0.1]),
        }
    }

    pub(super) fn for_role(&self, role: ModelRole) -> Arc<dyn Predictor> {
        match role {
            ModelRole::Approval => self.approval.clone(),
            ModelRole::Amount => self.amount.clone(),
            ModelRole::Risk => self.risk.clone(),
        }
    }

    pub(super) fn total_calls(&self) -> usize {
        self.approval.calls() + self.amount.calls() + self.risk.calls()
    }
}

pub(super) fn mortgage_pipeline(
    with_risk: bool,
) -> (ScoringPipeline<MortgageApplication>, InstalledModels) {
    let pipeline = ScoringPipeline::new(
        ProductDescriptor::mortgage(with_risk),
        PolicyConfig::default(),
    );
    let models = InstalledModels::standard();
    for role in pipeline.descriptor().required_roles() {
        pipeline
            .models()
            .install(role, models.for_role(role))
            .expect("model installs");
    }
    (pipeline, models)
}

/// Service with every product ready, backed by the standard doubles.
pub(super) fn ready_service() -> (ScoringService, InstalledModels) {
    let service = ScoringService::new(PolicyConfig::default(), true);
    let models = InstalledModels::standard();
    for product in Product::ALL {
        for role in service.descriptor(product).required_roles() {
            service
                .install(product, role, models.for_role(role))
                .expect("model installs");
        }
    }
    (service, models)
}

pub(super) fn evaluator() -> PolicyEvaluator {
    PolicyEvaluator::new(PolicyConfig::default())
}

pub(super) fn terms(
    age: u32,
    annual_income: f64,
    monthly_debt: f64,
    property_price: f64,
    requested_loan: f64,
    term_years: u32,
) -> PolicyTerms {
    PolicyTerms::new(
        age,
        annual_income,
        monthly_debt,
        property_price,
        requested_loan,
        term_years,
    )
    .expect("valid policy terms")
}

/// Thirty-year-old borrower comfortably inside every threshold.
pub(super) fn baseline_mortgage() -> MortgageApplication {
    MortgageApplication {
        age: Some(30),
        annual_income: Some(60_000.0),
        monthly_debt: Some(1_500.0),
        property_price: Some(300_000.0),
        deposit_amount: Some(50_000.0),
        requested_loan: Some(250_000.0),
        mortgage_term_years: Some(30),
        mortgage_term_months: Some(360),
    }
}

/// Sixty-one-year-old borrower who passes once income is reduced to 42,000.
pub(super) fn eligible_retiree_mortgage() -> MortgageApplication {
    MortgageApplication {
        age: Some(61),
        annual_income: Some(70_000.0),
        monthly_debt: Some(500.0),
        property_price: Some(300_000.0),
        deposit_amount: Some(150_000.0),
        requested_loan: Some(150_000.0),
        mortgage_term_years: Some(10),
        mortgage_term_months: Some(120),
    }
}

pub(super) fn credit_card_application() -> CreditCardApplication {
    CreditCardApplication {
        age: Some(40),
        annual_income: Some(70_000.0),
        monthly_debt: Some(1_200.0),
        existing_cc_balance: Some(1_500.0),
        total_cc_limit: Some(8_000.0),
        requested_limit: Some(12_000.0),
    }
}

pub(super) fn personal_loan_application() -> PersonalLoanApplication {
    PersonalLoanApplication {
        age: Some(35),
        annual_income: Some(50_000.0),
        monthly_debt: Some(800.0),
        requested_loan: Some(15_000.0),
        loan_term_months: Some(36),
    }
}

pub(super) fn current_account_application() -> CurrentAccountApplication {
    CurrentAccountApplication {
        age: Some(28),
        annual_income: Some(42_000.0),
        monthly_debt: Some(400.0),
        avg_monthly_balance: Some(2_500.0),
        overdraft_usage: Some(200.0),
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 16 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
