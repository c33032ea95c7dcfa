use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::Serialize;

use super::domain::FeatureRow;

/// Purpose a model serves inside a product pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelRole {
    /// Binary classifier producing approve/decline probabilities.
    Approval,
    /// Regression producing an amount or limit.
    Amount,
    /// Multi-class classifier producing a risk band.
    Risk,
}

impl ModelRole {
    pub fn label(&self) -> &'static str {
        match self {
            ModelRole::Approval => "approval",
            ModelRole::Amount => "amount",
            ModelRole::Risk => "risk",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw binomial output; probabilities are ordered `[negative, positive]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryPrediction {
    pub label: String,
    pub class_probabilities: [f64; 2],
}

impl BinaryPrediction {
    pub fn probability_positive(&self) -> f64 {
        self.class_probabilities[1]
    }
}

/// Raw multinomial output; probabilities follow the model's class domain.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiClassPrediction {
    pub label: String,
    pub class_probabilities: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictorError {
    #[error("model does not support {0} prediction")]
    Unsupported(&'static str),
    #[error("model rejected feature row: {0}")]
    InvalidRow(String),
    #[error("model failure: {0}")]
    Internal(String),
    #[error("malformed {role} model output: {detail}")]
    MalformedOutput { role: ModelRole, detail: String },
}

/// Capability exposed by an already-loaded model. Implementations must be
/// safe for concurrent reads; loading happens once, outside the scoring path.
pub trait Predictor: Send + Sync {
    fn predict_binary(&self, _row: &FeatureRow) -> Result<BinaryPrediction, PredictorError> {
        Err(PredictorError::Unsupported("binary"))
    }

    fn predict_regression(&self, _row: &FeatureRow) -> Result<f64, PredictorError> {
        Err(PredictorError::Unsupported("regression"))
    }

    fn predict_multi_class(
        &self,
        _row: &FeatureRow,
    ) -> Result<MultiClassPrediction, PredictorError> {
        Err(PredictorError::Unsupported("multi-class"))
    }

    /// Ordered class labels of a multi-class model.
    fn class_domain(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Predictor handle plus the class domain captured when it was installed.
#[derive(Clone)]
pub struct LoadedModel {
    predictor: Arc<dyn Predictor>,
    class_domain: Arc<[String]>,
}

impl LoadedModel {
    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }

    pub fn class_domain(&self) -> &[String] {
        &self.class_domain
    }
}

impl fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModel")
            .field("class_domain", &self.class_domain)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelInstallError {
    #[error("{role} model is already loaded")]
    AlreadyLoaded { role: ModelRole },
    #[error("pipeline has no {role} model")]
    UnexpectedRole { role: ModelRole },
    #[error("risk model reported an empty class domain")]
    EmptyClassDomain,
    #[error("risk model class domain repeats label '{0}'")]
    DuplicateClassLabel(String),
}

/// Write-once holder for one model of a pipeline.
#[derive(Debug)]
pub struct ModelSlot {
    role: ModelRole,
    loaded: OnceLock<LoadedModel>,
}

impl ModelSlot {
    pub fn new(role: ModelRole) -> Self {
        Self {
            role,
            loaded: OnceLock::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    pub fn get(&self) -> Option<&LoadedModel> {
        self.loaded.get()
    }

    /// Fills the slot. Risk models have their class domain read here, once.
    pub fn install(&self, predictor: Arc<dyn Predictor>) -> Result<(), ModelInstallError> {
        if self.is_loaded() {
            return Err(ModelInstallError::AlreadyLoaded { role: self.role });
        }

        let class_domain: Arc<[String]> = match self.role {
            ModelRole::Risk => {
                let domain = predictor.class_domain();
                if domain.is_empty() {
                    return Err(ModelInstallError::EmptyClassDomain);
                }
                if let Some(duplicate) = first_duplicate(&domain) {
                    return Err(ModelInstallError::DuplicateClassLabel(duplicate));
                }
                domain.into()
            }
            ModelRole::Approval | ModelRole::Amount => Arc::from(Vec::new()),
        };

        self.loaded
            .set(LoadedModel {
                predictor,
                class_domain,
            })
            .map_err(|_| ModelInstallError::AlreadyLoaded { role: self.role })
    }
}

fn first_duplicate(labels: &[String]) -> Option<String> {
    let mut seen = HashSet::new();
    labels
        .iter()
        .find(|label| !seen.insert(label.as_str()))
        .cloned()
}
