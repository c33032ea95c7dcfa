use serde::Serialize;

pub const INCOME_ADJUSTED_MESSAGE: &str = "Income adjusted for retirement";
pub const ELIGIBLE_MESSAGE: &str = "Eligible under policy rules";

/// Outcome of the rulebook for one application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PolicyVerdict {
    Approved {
        income_adjustment: Option<IncomeAdjustment>,
    },
    Declined(DeclineReason),
}

impl PolicyVerdict {
    pub fn is_approved(&self) -> bool {
        matches!(self, PolicyVerdict::Approved { .. })
    }

    pub fn decline_reason(&self) -> Option<String> {
        match self {
            PolicyVerdict::Declined(reason) => Some(reason.summary()),
            PolicyVerdict::Approved { .. } => None,
        }
    }

    pub fn income_adjusted(&self) -> bool {
        self.adjusted_income().is_some()
    }

    pub fn adjusted_income(&self) -> Option<f64> {
        match self {
            PolicyVerdict::Approved {
                income_adjustment: Some(adjustment),
            } => Some(adjustment.adjusted_income),
            _ => None,
        }
    }

    /// Narrative returned alongside the decision.
    pub fn policy_message(&self) -> String {
        match self {
            PolicyVerdict::Declined(reason) => reason.summary(),
            PolicyVerdict::Approved {
                income_adjustment: Some(_),
            } => INCOME_ADJUSTED_MESSAGE.to_string(),
            PolicyVerdict::Approved {
                income_adjustment: None,
            } => ELIGIBLE_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IncomeAdjustment {
    pub declared_income: f64,
    pub adjusted_income: f64,
}

/// Rule that stopped the application, with the threshold it breached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DeclineReason {
    TermExceedsAgeLimit {
        max_term_years: u32,
    },
    LoanToValueExceeded {
        max_ratio: f64,
        actual_ratio: f64,
    },
    DebtToIncomeExceeded {
        max_ratio: f64,
        actual_ratio: f64,
    },
    IncomeMultipleExceeded {
        max_multiple: f64,
        actual_multiple: f64,
    },
}

impl DeclineReason {
    pub fn summary(&self) -> String {
        match self {
            DeclineReason::TermExceedsAgeLimit { max_term_years } => format!(
                "Loan term too long for applicant age. Maximum allowed: {max_term_years} years"
            ),
            DeclineReason::LoanToValueExceeded { max_ratio, .. } => format!(
                "Loan-to-value exceeds allowable maximum ({}%)",
                percent(*max_ratio)
            ),
            DeclineReason::DebtToIncomeExceeded { actual_ratio, .. } => format!(
                "Debt-to-income ratio too high ({}%)",
                (actual_ratio * 100.0).round() as i64
            ),
            DeclineReason::IncomeMultipleExceeded { max_multiple, .. } => format!(
                "Requested loan exceeds income multiple limit ({max_multiple}× income)"
            ),
        }
    }
}

/// Ratio as a percentage with trailing zeros dropped: 0.95 is "95", 0.955 is "95.5".
fn percent(ratio: f64) -> String {
    let rendered = format!("{:.2}", ratio * 100.0);
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
