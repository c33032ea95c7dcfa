use serde::{Deserialize, Serialize};

/// Lending thresholds applied by the mortgage rulebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub max_age_at_term_end: u32,
    pub retirement_age: u32,
    /// Share of declared income counted once the applicant reaches retirement age.
    pub retirement_income_factor: f64,
    pub max_loan_to_value: f64,
    pub max_debt_to_income: f64,
    pub max_income_multiple: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_age_at_term_end: 75,
            retirement_age: 60,
            retirement_income_factor: 0.60,
            max_loan_to_value: 0.95,
            max_debt_to_income: 0.40,
            max_income_multiple: 4.5,
        }
    }
}
