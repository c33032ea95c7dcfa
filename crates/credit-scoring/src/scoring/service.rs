use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

use super::decision::Decision;
use super::domain::{
    CreditCardApplication, CurrentAccountApplication, InvalidApplication, MortgageApplication,
    PersonalLoanApplication, Product,
};
use super::pipeline::{ProductDescriptor, ProductModels, ScoringPipeline};
use super::policy::PolicyConfig;
use super::predictor::{ModelInstallError, ModelRole, Predictor, PredictorError};

/// Facade owning one pipeline per product.
pub struct ScoringService {
    mortgage: ScoringPipeline<MortgageApplication>,
    credit_card: ScoringPipeline<CreditCardApplication>,
    personal_loan: ScoringPipeline<PersonalLoanApplication>,
    current_account: ScoringPipeline<CurrentAccountApplication>,
}

impl ScoringService {
    /// `mortgage_risk` adds the multi-class risk model to the mortgage pipeline.
    pub fn new(policy: PolicyConfig, mortgage_risk: bool) -> Self {
        Self {
            mortgage: ScoringPipeline::new(
                ProductDescriptor::mortgage(mortgage_risk),
                policy.clone(),
            ),
            credit_card: ScoringPipeline::new(ProductDescriptor::credit_card(), policy.clone()),
            personal_loan: ScoringPipeline::new(
                ProductDescriptor::personal_loan(),
                policy.clone(),
            ),
            current_account: ScoringPipeline::new(ProductDescriptor::current_account(), policy),
        }
    }

    pub fn score_mortgage(
        &self,
        application: &MortgageApplication,
    ) -> Result<Decision, ScoringError> {
        self.mortgage.score(application)
    }

    pub fn score_credit_card(
        &self,
        application: &CreditCardApplication,
    ) -> Result<Decision, ScoringError> {
        self.credit_card.score(application)
    }

    pub fn score_personal_loan(
        &self,
        application: &PersonalLoanApplication,
    ) -> Result<Decision, ScoringError> {
        self.personal_loan.score(application)
    }

    pub fn score_current_account(
        &self,
        application: &CurrentAccountApplication,
    ) -> Result<Decision, ScoringError> {
        self.current_account.score(application)
    }

    pub fn descriptor(&self, product: Product) -> &ProductDescriptor {
        match product {
            Product::Mortgage => self.mortgage.descriptor(),
            Product::CreditCard => self.credit_card.descriptor(),
            Product::PersonalLoan => self.personal_loan.descriptor(),
            Product::CurrentAccount => self.current_account.descriptor(),
        }
    }

    fn models(&self, product: Product) -> &ProductModels {
        match product {
            Product::Mortgage => self.mortgage.models(),
            Product::CreditCard => self.credit_card.models(),
            Product::PersonalLoan => self.personal_loan.models(),
            Product::CurrentAccount => self.current_account.models(),
        }
    }

    pub fn install(
        &self,
        product: Product,
        role: ModelRole,
        predictor: Arc<dyn Predictor>,
    ) -> Result<(), ModelInstallError> {
        self.models(product).install(role, predictor)
    }

    pub fn is_ready(&self, product: Product) -> bool {
        self.models(product).is_ready()
    }

    pub fn readiness(&self) -> ReadinessReport {
        let products: BTreeMap<&'static str, bool> = Product::ALL
            .into_iter()
            .map(|product| (product.slug(), self.is_ready(product)))
            .collect();
        let up = products.values().all(|ready| *ready);

        ReadinessReport {
            status: if up { "UP" } else { "DOWN" },
            products,
            reason: (!up).then_some("Models not loaded"),
        }
    }
}

/// Aggregate readiness across every product pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub status: &'static str,
    pub products: BTreeMap<&'static str, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl ReadinessReport {
    pub fn is_up(&self) -> bool {
        self.status == "UP"
    }
}

/// Error raised by a scoring pipeline. A policy decline is not an error.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("Models not loaded")]
    NotReady { product: Product },
    #[error(transparent)]
    InvalidInput(#[from] InvalidApplication),
    #[error("prediction failed: {0}")]
    Predictor(#[from] PredictorError),
}

impl ScoringError {
    /// Only a missing model is reported as unavailable; every other failure
    /// is a server error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ScoringError::NotReady { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ScoringError::InvalidInput(_) | ScoringError::Predictor(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ScoringError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ScoringError::NotReady { product } => {
                warn!(%product, "scoring requested before models loaded")
            }
            ScoringError::InvalidInput(err) => warn!(error = %err, "rejected application"),
            ScoringError::Predictor(err) => error!(error = %err, "model invocation failed"),
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
