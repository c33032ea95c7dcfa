use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::decision::Decision;
use super::domain::{
    CreditCardApplication, CurrentAccountApplication, MortgageApplication,
    PersonalLoanApplication,
};
use super::service::{ReadinessReport, ScoringError, ScoringService};

/// Router exposing one scoring endpoint per product plus aggregate health.
pub fn scoring_router(service: Arc<ScoringService>) -> Router {
    Router::new()
        .route("/api/score/mo", post(mortgage_handler))
        .route("/api/score/cc", post(credit_card_handler))
        .route("/api/score/ln", post(personal_loan_handler))
        .route("/api/score/ca", post(current_account_handler))
        .route("/api/health", get(health_handler))
        .with_state(service)
}

pub(crate) async fn mortgage_handler(
    State(service): State<Arc<ScoringService>>,
    Json(application): Json<MortgageApplication>,
) -> Result<Json<Decision>, ScoringError> {
    service.score_mortgage(&application).map(Json)
}

pub(crate) async fn credit_card_handler(
    State(service): State<Arc<ScoringService>>,
    Json(application): Json<CreditCardApplication>,
) -> Result<Json<Decision>, ScoringError> {
    service.score_credit_card(&application).map(Json)
}

pub(crate) async fn personal_loan_handler(
    State(service): State<Arc<ScoringService>>,
    Json(application): Json<PersonalLoanApplication>,
) -> Result<Json<Decision>, ScoringError> {
    service.score_personal_loan(&application).map(Json)
}

pub(crate) async fn current_account_handler(
    State(service): State<Arc<ScoringService>>,
    Json(application): Json<CurrentAccountApplication>,
) -> Result<Json<Decision>, ScoringError> {
    service.score_current_account(&application).map(Json)
}

pub(crate) async fn health_handler(
    State(service): State<Arc<ScoringService>>,
) -> Json<ReadinessReport> {
    Json(service.readiness())
}
