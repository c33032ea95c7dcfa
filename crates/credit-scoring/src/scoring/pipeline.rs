use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, info};

use super::decision::{amount_part, approval_part, risk_part, Decision};
use super::domain::{FeatureRow, InvalidApplication, Product, ProductApplication};
use super::policy::{PolicyConfig, PolicyEvaluator, PolicyVerdict};
use super::predictor::{LoadedModel, ModelInstallError, ModelRole, ModelSlot, Predictor};
use super::service::ScoringError;

/// Per-product shape of the pipeline: which models it calls and whether the
/// lending policy gates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductDescriptor {
    pub product: Product,
    pub policy_gated: bool,
    pub amount_model: bool,
    pub risk_model: bool,
}

impl ProductDescriptor {
    pub const fn mortgage(with_risk: bool) -> Self {
        Self {
            product: Product::Mortgage,
            policy_gated: true,
            amount_model: true,
            risk_model: with_risk,
        }
    }

    pub const fn credit_card() -> Self {
        Self {
            product: Product::CreditCard,
            policy_gated: false,
            amount_model: true,
            risk_model: false,
        }
    }

    pub const fn personal_loan() -> Self {
        Self {
            product: Product::PersonalLoan,
            policy_gated: false,
            amount_model: true,
            risk_model: false,
        }
    }

    pub const fn current_account() -> Self {
        Self {
            product: Product::CurrentAccount,
            policy_gated: false,
            amount_model: false,
            risk_model: false,
        }
    }

    pub fn required_roles(&self) -> Vec<ModelRole> {
        let mut roles = vec![ModelRole::Approval];
        if self.amount_model {
            roles.push(ModelRole::Amount);
        }
        if self.risk_model {
            roles.push(ModelRole::Risk);
        }
        roles
    }
}

/// Model slots required by one product.
#[derive(Debug)]
pub struct ProductModels {
    approval: ModelSlot,
    amount: Option<ModelSlot>,
    risk: Option<ModelSlot>,
}

impl ProductModels {
    pub fn for_descriptor(descriptor: &ProductDescriptor) -> Self {
        Self {
            approval: ModelSlot::new(ModelRole::Approval),
            amount: descriptor
                .amount_model
                .then(|| ModelSlot::new(ModelRole::Amount)),
            risk: descriptor
                .risk_model
                .then(|| ModelSlot::new(ModelRole::Risk)),
        }
    }

    pub fn slot(&self, role: ModelRole) -> Option<&ModelSlot> {
        match role {
            ModelRole::Approval => Some(&self.approval),
            ModelRole::Amount => self.amount.as_ref(),
            ModelRole::Risk => self.risk.as_ref(),
        }
    }

    pub fn install(
        &self,
        role: ModelRole,
        predictor: Arc<dyn Predictor>,
    ) -> Result<(), ModelInstallError> {
        self.slot(role)
            .ok_or(ModelInstallError::UnexpectedRole { role })?
            .install(predictor)
    }

    pub fn is_ready(&self) -> bool {
        self.ready().is_some()
    }

    fn ready(&self) -> Option<ReadyModels<'_>> {
        let approval = self.approval.get()?;
        let amount = match &self.amount {
            Some(slot) => Some(slot.get()?),
            None => None,
        };
        let risk = match &self.risk {
            Some(slot) => Some(slot.get()?),
            None => None,
        };
        Some(ReadyModels {
            approval,
            amount,
            risk,
        })
    }
}

struct ReadyModels<'a> {
    approval: &'a LoadedModel,
    amount: Option<&'a LoadedModel>,
    risk: Option<&'a LoadedModel>,
}

/// Readiness check, optional policy gate, model calls, and decision assembly
/// for one product.
pub struct ScoringPipeline<A> {
    descriptor: ProductDescriptor,
    policy: Option<PolicyEvaluator>,
    models: ProductModels,
    _application: PhantomData<fn(&A)>,
}

impl<A: ProductApplication> ScoringPipeline<A> {
    pub fn new(descriptor: ProductDescriptor, policy: PolicyConfig) -> Self {
        debug_assert_eq!(descriptor.product, A::PRODUCT);
        Self {
            policy: descriptor
                .policy_gated
                .then(|| PolicyEvaluator::new(policy)),
            models: ProductModels::for_descriptor(&descriptor),
            descriptor,
            _application: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &ProductDescriptor {
        &self.descriptor
    }

    pub fn models(&self) -> &ProductModels {
        &self.models
    }

    pub fn is_ready(&self) -> bool {
        self.models.is_ready()
    }

    pub fn score(&self, application: &A) -> Result<Decision, ScoringError> {
        let product = self.descriptor.product;
        let models = self
            .models
            .ready()
            .ok_or(ScoringError::NotReady { product })?;

        application.validate()?;

        let (effective, policy_message) = match &self.policy {
            Some(policy) => {
                let terms = application
                    .policy_terms()?
                    .ok_or(InvalidApplication::PolicyTermsUnavailable { product })?;
                let verdict = policy.evaluate(&terms);
                if let PolicyVerdict::Declined(reason) = &verdict {
                    let message = reason.summary();
                    info!(%product, reason = %message, "application declined by policy");
                    return Ok(Decision::policy_decline(message));
                }

                let effective = match verdict.adjusted_income() {
                    Some(income) => Cow::Owned(
                        application
                            .with_annual_income(income)
                            .ok_or(InvalidApplication::PolicyTermsUnavailable { product })?,
                    ),
                    None => Cow::Borrowed(application),
                };
                (effective, Some(verdict.policy_message()))
            }
            None => (Cow::Borrowed(application), None),
        };

        let row = effective.feature_row();
        debug!(%product, features = row.len(), "invoking models");
        let decision = Self::predict(&models, &row, policy_message)?;

        info!(
            %product,
            label = %decision.approval.label,
            prob_approved = decision.approval.prob_approved,
            "application scored"
        );
        Ok(decision)
    }

    fn predict(
        models: &ReadyModels<'_>,
        row: &FeatureRow,
        policy_message: Option<String>,
    ) -> Result<Decision, ScoringError> {
        let approval = approval_part(models.approval.predictor().predict_binary(row)?)?;

        let loan_amount = match models.amount {
            Some(model) => Some(amount_part(model.predictor().predict_regression(row)?)?),
            None => None,
        };

        let risk = match models.risk {
            Some(model) => Some(risk_part(
                model.predictor().predict_multi_class(row)?,
                model.class_domain(),
            )?),
            None => None,
        };

        Ok(Decision {
            approval,
            loan_amount,
            risk,
            policy_message,
        })
    }
}
