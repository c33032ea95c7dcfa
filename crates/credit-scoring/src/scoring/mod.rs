//! Policy-gated multi-model scoring.
//!
//! Each product runs the same pipeline: readiness check, input validation,
//! the mortgage lending policy where it applies, then the approval, amount,
//! and risk models the product requires. Models are reached through the
//! [`Predictor`] port and installed once into write-once slots.

pub mod decision;
pub mod domain;
pub mod pipeline;
pub mod policy;
pub mod predictor;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use decision::{
    ApprovalPart, ClassProbabilities, Decision, LoanAmountPart, RiskPart, DECLINED_LABEL,
};
pub use domain::{
    CreditCardApplication, CurrentAccountApplication, FeatureRow, InvalidApplication,
    MortgageApplication, PersonalLoanApplication, Product, ProductApplication,
};
pub use pipeline::{ProductDescriptor, ProductModels, ScoringPipeline};
pub use policy::{
    DeclineReason, IncomeAdjustment, PolicyConfig, PolicyEvaluator, PolicyTerms, PolicyVerdict,
};
pub use predictor::{
    BinaryPrediction, LoadedModel, ModelInstallError, ModelRole, ModelSlot, MultiClassPrediction,
    Predictor, PredictorError,
};
pub use router::scoring_router;
pub use service::{ReadinessReport, ScoringError, ScoringService};
