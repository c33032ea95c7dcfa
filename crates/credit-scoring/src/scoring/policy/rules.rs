use tracing::debug;

use super::config::PolicyConfig;
use super::verdict::{DeclineReason, IncomeAdjustment, PolicyVerdict};
use super::PolicyTerms;

/// Applies the rules in their fixed order; the first breach ends evaluation.
pub(crate) fn evaluate_rules(terms: &PolicyTerms, config: &PolicyConfig) -> PolicyVerdict {
    let age_at_term_end = terms.age().saturating_add(terms.term_years());
    if age_at_term_end > config.max_age_at_term_end {
        return PolicyVerdict::Declined(DeclineReason::TermExceedsAgeLimit {
            max_term_years: config.max_age_at_term_end.saturating_sub(terms.age()),
        });
    }

    let income_adjustment = (terms.age() >= config.retirement_age).then(|| IncomeAdjustment {
        declared_income: terms.annual_income(),
        adjusted_income: terms.annual_income() * config.retirement_income_factor,
    });
    let effective_income = income_adjustment
        .map(|adjustment| adjustment.adjusted_income)
        .unwrap_or_else(|| terms.annual_income());
    if let Some(adjustment) = &income_adjustment {
        debug!(
            declared = adjustment.declared_income,
            adjusted = adjustment.adjusted_income,
            "retirement income adjustment applied"
        );
    }

    let loan_to_value = terms.requested_loan() / terms.property_price();
    if loan_to_value > config.max_loan_to_value {
        return PolicyVerdict::Declined(DeclineReason::LoanToValueExceeded {
            max_ratio: config.max_loan_to_value,
            actual_ratio: loan_to_value,
        });
    }

    let debt_to_income = terms.monthly_debt() / (effective_income / 12.0);
    if debt_to_income > config.max_debt_to_income {
        return PolicyVerdict::Declined(DeclineReason::DebtToIncomeExceeded {
            max_ratio: config.max_debt_to_income,
            actual_ratio: debt_to_income,
        });
    }

    let income_multiple = terms.requested_loan() / effective_income;
    if income_multiple > config.max_income_multiple {
        return PolicyVerdict::Declined(DeclineReason::IncomeMultipleExceeded {
            max_multiple: config.max_income_multiple,
            actual_multiple: income_multiple,
        });
    }

    debug!(
        loan_to_value,
        debt_to_income, income_multiple, "application within policy thresholds"
    );
    PolicyVerdict::Approved { income_adjustment }
}
