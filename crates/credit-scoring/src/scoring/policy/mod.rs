//! Deterministic mortgage lending policy evaluated ahead of any model call.

mod config;
mod rules;
mod verdict;

pub use config::PolicyConfig;
pub use verdict::{
    DeclineReason, IncomeAdjustment, PolicyVerdict, ELIGIBLE_MESSAGE, INCOME_ADJUSTED_MESSAGE,
};

use super::domain::{ensure_non_negative, ensure_positive, InvalidApplication};

/// Validated inputs for the rulebook. Construction rejects the zero and
/// negative denominators the ratios would otherwise divide by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyTerms {
    age: u32,
    annual_income: f64,
    monthly_debt: f64,
    property_price: f64,
    requested_loan: f64,
    term_years: u32,
}

impl PolicyTerms {
    pub fn new(
        age: u32,
        annual_income: f64,
        monthly_debt: f64,
        property_price: f64,
        requested_loan: f64,
        term_years: u32,
    ) -> Result<Self, InvalidApplication> {
        Ok(Self {
            age,
            annual_income: ensure_positive("annual_income", annual_income)?,
            monthly_debt: ensure_non_negative("monthly_debt", monthly_debt)?,
            property_price: ensure_positive("property_price", property_price)?,
            requested_loan: ensure_non_negative("requested_loan", requested_loan)?,
            term_years,
        })
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn annual_income(&self) -> f64 {
        self.annual_income
    }

    pub fn monthly_debt(&self) -> f64 {
        self.monthly_debt
    }

    pub fn property_price(&self) -> f64 {
        self.property_price
    }

    pub fn requested_loan(&self) -> f64 {
        self.requested_loan
    }

    pub fn term_years(&self) -> u32 {
        self.term_years
    }
}

/// Stateless evaluator that applies the configured thresholds to a set of terms.
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    config: PolicyConfig,
}

impl PolicyEvaluator {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, terms: &PolicyTerms) -> PolicyVerdict {
        rules::evaluate_rules(terms, &self.config)
    }
}
