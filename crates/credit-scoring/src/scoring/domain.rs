use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::policy::PolicyTerms;

/// Financial products served by the scoring service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    Mortgage,
    CreditCard,
    PersonalLoan,
    CurrentAccount,
}

impl Product {
    pub const ALL: [Product; 4] = [
        Product::Mortgage,
        Product::CreditCard,
        Product::PersonalLoan,
        Product::CurrentAccount,
    ];

    /// Short route segment, e.g. `/api/score/mo`.
    pub fn slug(&self) -> &'static str {
        match self {
            Product::Mortgage => "mo",
            Product::CreditCard => "cc",
            Product::PersonalLoan => "ln",
            Product::CurrentAccount => "ca",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        let slug = slug.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|product| product.slug() == slug)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Product::Mortgage => "mortgage",
            Product::CreditCard => "credit card",
            Product::PersonalLoan => "personal loan",
            Product::CurrentAccount => "current account",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Named model inputs for a single scoring call. Unset fields are omitted so
/// the model applies its own defaulting.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureRow(BTreeMap<&'static str, f64>);

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Into<f64>>(mut self, name: &'static str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.0.insert(name, value.into());
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Caller error raised before any rule or model sees the application.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidApplication {
    #[error("{product} application is missing required field `{field}`")]
    MissingField {
        product: Product,
        field: &'static str,
    },
    #[error("`{field}` must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("`{field}` must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("`{field}` must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{product} applications carry no policy terms")]
    PolicyTermsUnavailable { product: Product },
}

pub(crate) fn require<T>(
    product: Product,
    field: &'static str,
    value: Option<T>,
) -> Result<T, InvalidApplication> {
    value.ok_or(InvalidApplication::MissingField { product, field })
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<f64, InvalidApplication> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidApplication::NotFinite { field })
    }
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64, InvalidApplication> {
    if ensure_finite(field, value)? > 0.0 {
        Ok(value)
    } else {
        Err(InvalidApplication::NotPositive { field, value })
    }
}

pub(crate) fn ensure_non_negative(
    field: &'static str,
    value: f64,
) -> Result<f64, InvalidApplication> {
    if ensure_finite(field, value)? >= 0.0 {
        Ok(value)
    } else {
        Err(InvalidApplication::Negative { field, value })
    }
}

fn check_amounts(fields: &[(&'static str, Option<f64>)]) -> Result<(), InvalidApplication> {
    for &(field, value) in fields {
        if let Some(value) = value {
            ensure_non_negative(field, value)?;
        }
    }
    Ok(())
}

/// Inbound application shape shared by every product pipeline.
pub trait ProductApplication: Clone + Send + Sync {
    const PRODUCT: Product;

    /// Rejects impossible values; absent optional fields are not an error.
    fn validate(&self) -> Result<(), InvalidApplication>;

    fn feature_row(&self) -> FeatureRow;

    /// Inputs for the lending policy, for products the rulebook covers.
    fn policy_terms(&self) -> Result<Option<PolicyTerms>, InvalidApplication> {
        Ok(None)
    }

    /// Copy of the application carrying a different annual income, for
    /// products whose policy can adjust income.
    fn with_annual_income(&self, _annual_income: f64) -> Option<Self> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MortgageApplication {
    pub age: Option<u32>,
    pub annual_income: Option<f64>,
    pub monthly_debt: Option<f64>,
    pub property_price: Option<f64>,
    pub deposit_amount: Option<f64>,
    pub requested_loan: Option<f64>,
    pub mortgage_term_years: Option<u32>,
    pub mortgage_term_months: Option<u32>,
}

impl ProductApplication for MortgageApplication {
    const PRODUCT: Product = Product::Mortgage;

    fn validate(&self) -> Result<(), InvalidApplication> {
        check_amounts(&[("deposit_amount", self.deposit_amount)])?;
        self.policy_terms().map(|_| ())
    }

    fn feature_row(&self) -> FeatureRow {
        FeatureRow::new()
            .with("age", self.age)
            .with("annual_income", self.annual_income)
            .with("monthly_debt", self.monthly_debt)
            .with("property_price", self.property_price)
            .with("deposit_amount", self.deposit_amount)
            .with("requested_loan", self.requested_loan)
            .with("mortgage_term_years", self.mortgage_term_years)
            .with("mortgage_term_months", self.mortgage_term_months)
    }

    fn policy_terms(&self) -> Result<Option<PolicyTerms>, InvalidApplication> {
        let product = Self::PRODUCT;
        let terms = PolicyTerms::new(
            require(product, "age", self.age)?,
            require(product, "annual_income", self.annual_income)?,
            require(product, "monthly_debt", self.monthly_debt)?,
            require(product, "property_price", self.property_price)?,
            require(product, "requested_loan", self.requested_loan)?,
            require(product, "mortgage_term_years", self.mortgage_term_years)?,
        )?;
        Ok(Some(terms))
    }

    fn with_annual_income(&self, annual_income: f64) -> Option<Self> {
        Some(Self {
            annual_income: Some(annual_income),
            ..self.clone()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreditCardApplication {
    pub age: Option<u32>,
    pub annual_income: Option<f64>,
    pub monthly_debt: Option<f64>,
    pub existing_cc_balance: Option<f64>,
    pub total_cc_limit: Option<f64>,
    pub requested_limit: Option<f64>,
}

impl ProductApplication for CreditCardApplication {
    const PRODUCT: Product = Product::CreditCard;

    fn validate(&self) -> Result<(), InvalidApplication> {
        check_amounts(&[
            ("annual_income", self.annual_income),
            ("monthly_debt", self.monthly_debt),
            ("existing_cc_balance", self.existing_cc_balance),
            ("total_cc_limit", self.total_cc_limit),
            ("requested_limit", self.requested_limit),
        ])
    }

    fn feature_row(&self) -> FeatureRow {
        FeatureRow::new()
            .with("age", self.age)
            .with("annual_income", self.annual_income)
            .with("monthly_debt", self.monthly_debt)
            .with("existing_cc_balance", self.existing_cc_balance)
            .with("total_cc_limit", self.total_cc_limit)
            .with("requested_limit", self.requested_limit)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalLoanApplication {
    pub age: Option<u32>,
    pub annual_income: Option<f64>,
    pub monthly_debt: Option<f64>,
    pub requested_loan: Option<f64>,
    pub loan_term_months: Option<u32>,
}

impl ProductApplication for PersonalLoanApplication {
    const PRODUCT: Product = Product::PersonalLoan;

    fn validate(&self) -> Result<(), InvalidApplication> {
        check_amounts(&[
            ("annual_income", self.annual_income),
            ("monthly_debt", self.monthly_debt),
            ("requested_loan", self.requested_loan),
        ])
    }

    fn feature_row(&self) -> FeatureRow {
        FeatureRow::new()
            .with("age", self.age)
            .with("annual_income", self.annual_income)
            .with("monthly_debt", self.monthly_debt)
            .with("requested_loan", self.requested_loan)
            .with("loan_term_months", self.loan_term_months)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentAccountApplication {
    pub age: Option<u32>,
    pub annual_income: Option<f64>,
    pub monthly_debt: Option<f64>,
    /// May be negative for accounts that sit overdrawn.
    pub avg_monthly_balance: Option<f64>,
    pub overdraft_usage: Option<f64>,
}

impl ProductApplication for CurrentAccountApplication {
    const PRODUCT: Product = Product::CurrentAccount;

    fn validate(&self) -> Result<(), InvalidApplication> {
        if let Some(balance) = self.avg_monthly_balance {
            ensure_finite("avg_monthly_balance", balance)?;
        }
        check_amounts(&[
            ("annual_income", self.annual_income),
            ("monthly_debt", self.monthly_debt),
            ("overdraft_usage", self.overdraft_usage),
        ])
    }

    fn feature_row(&self) -> FeatureRow {
        FeatureRow::new()
            .with("age", self.age)
            .with("annual_income", self.annual_income)
            .with("monthly_debt", self.monthly_debt)
            .with("avg_monthly_balance", self.avg_monthly_balance)
            .with("overdraft_usage", self.overdraft_usage)
    }
}
