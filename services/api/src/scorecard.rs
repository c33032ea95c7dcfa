use credit_scoring::scoring::{
    BinaryPrediction, FeatureRow, ModelRole, MultiClassPrediction, Predictor, PredictorError,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Linear scorecard artifact loaded from JSON.
///
/// `binomial` cards pass their score through the logistic link,
/// `regression` cards return it unchanged and `multinomial` cards hold one
/// card per class combined with a softmax. Features absent from a row
/// contribute nothing to the score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Scorecard {
    Binomial(BinomialCard),
    Regression(RegressionCard),
    Multinomial(MultinomialCard),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct LinearTerms {
    #[serde(default)]
    intercept: f64,
    #[serde(default)]
    weights: BTreeMap<String, f64>,
}

impl LinearTerms {
    fn score(&self, row: &FeatureRow) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .filter_map(|(name, weight)| row.get(name).map(|value| weight * value))
                .sum::<f64>()
    }

    fn check(&self) -> Result<(), ArtifactError> {
        if !self.intercept.is_finite() {
            return Err(ArtifactError::Invalid("intercept is not finite".to_string()));
        }
        match self.weights.iter().find(|(_, weight)| !weight.is_finite()) {
            Some((name, _)) => Err(ArtifactError::Invalid(format!(
                "weight for `{name}` is not finite"
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct BinomialCard {
    #[serde(flatten)]
    terms: LinearTerms,
    /// Labels ordered `[negative, positive]`.
    #[serde(default = "default_binomial_labels")]
    labels: [String; 2],
    #[serde(default = "default_threshold")]
    threshold: f64,
}

fn default_binomial_labels() -> [String; 2] {
    ["Declined".to_string(), "Approved".to_string()]
}

fn default_threshold() -> f64 {
    0.5
}

impl BinomialCard {
    fn predict(&self, row: &FeatureRow) -> BinaryPrediction {
        let positive = logistic(self.terms.score(row));
        let [negative_label, positive_label] = &self.labels;
        let label = if positive >= self.threshold {
            positive_label
        } else {
            negative_label
        };
        BinaryPrediction {
            label: label.clone(),
            class_probabilities: [1.0 - positive, positive],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct RegressionCard {
    #[serde(flatten)]
    terms: LinearTerms,
    /// Lower bound applied to the prediction, e.g. zero for amounts.
    #[serde(default)]
    floor: Option<f64>,
}

impl RegressionCard {
    fn predict(&self, row: &FeatureRow) -> f64 {
        let value = self.terms.score(row);
        match self.floor {
            Some(floor) => value.max(floor),
            None => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct MultinomialCard {
    classes: Vec<ClassCard>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct ClassCard {
    label: String,
    #[serde(flatten)]
    terms: LinearTerms,
}

impl MultinomialCard {
    fn predict(&self, row: &FeatureRow) -> MultiClassPrediction {
        let scores: Vec<f64> = self
            .classes
            .iter()
            .map(|class| class.terms.score(row))
            .collect();
        let probabilities = softmax(&scores);
        let label = probabilities
            .iter()
            .zip(&self.classes)
            .fold(None::<(f64, &str)>, |best, (probability, class)| match best {
                Some((top, _)) if top >= *probability => best,
                _ => Some((*probability, class.label.as_str())),
            })
            .map(|(_, label)| label.to_string())
            .unwrap_or_default();

        MultiClassPrediction {
            label,
            class_probabilities: probabilities,
        }
    }
}

fn logistic(score: f64) -> f64 {
    1.0 / (1.0 + (-score).exp())
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|score| (score - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|value| value / total).collect()
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum ArtifactError {
    #[error("failed to read artifact: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse artifact: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("expected a {expected} model but the artifact describes a {found} model")]
    RoleMismatch { expected: ModelRole, found: ModelRole },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

impl Scorecard {
    /// Reads a scorecard and checks it can serve `role`.
    pub(crate) fn load(path: &Path, role: ModelRole) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw, role)
    }

    pub(crate) fn parse(raw: &str, role: ModelRole) -> Result<Self, ArtifactError> {
        let scorecard: Scorecard = serde_json::from_str(raw)?;
        if scorecard.role() != role {
            return Err(ArtifactError::RoleMismatch {
                expected: role,
                found: scorecard.role(),
            });
        }
        scorecard.check()?;
        Ok(scorecard)
    }

    pub(crate) fn role(&self) -> ModelRole {
        match self {
            Scorecard::Binomial(_) => ModelRole::Approval,
            Scorecard::Regression(_) => ModelRole::Amount,
            Scorecard::Multinomial(_) => ModelRole::Risk,
        }
    }

    fn check(&self) -> Result<(), ArtifactError> {
        match self {
            Scorecard::Binomial(card) => {
                if !(card.threshold > 0.0 && card.threshold < 1.0) {
                    return Err(ArtifactError::Invalid(format!(
                        "threshold {} must lie strictly between 0 and 1",
                        card.threshold
                    )));
                }
                card.terms.check()
            }
            Scorecard::Regression(card) => card.terms.check(),
            Scorecard::Multinomial(card) => {
                if card.classes.len() < 2 {
                    return Err(ArtifactError::Invalid(
                        "multinomial scorecard needs at least two classes".to_string(),
                    ));
                }
                let mut seen = HashSet::new();
                for class in &card.classes {
                    if !seen.insert(class.label.as_str()) {
                        return Err(ArtifactError::Invalid(format!(
                            "class `{}` appears twice",
                            class.label
                        )));
                    }
                    class.terms.check()?;
                }
                Ok(())
            }
        }
    }
}

impl Predictor for Scorecard {
    fn predict_binary(&self, row: &FeatureRow) -> Result<BinaryPrediction, PredictorError> {
        match self {
            Scorecard::Binomial(card) => Ok(card.predict(row)),
            _ => Err(PredictorError::Unsupported("binary")),
        }
    }

    fn predict_regression(&self, row: &FeatureRow) -> Result<f64, PredictorError> {
        match self {
            Scorecard::Regression(card) => Ok(card.predict(row)),
            _ => Err(PredictorError::Unsupported("regression")),
        }
    }

    fn predict_multi_class(
        &self,
        row: &FeatureRow,
    ) -> Result<MultiClassPrediction, PredictorError> {
        match self {
            Scorecard::Multinomial(card) => Ok(card.predict(row)),
            _ => Err(PredictorError::Unsupported("multi-class")),
        }
    }

    fn class_domain(&self) -> Vec<String> {
        match self {
            Scorecard::Multinomial(card) => card
                .classes
                .iter()
                .map(|class| class.label.clone())
                .collect(),
            _ => Vec::new(),
        }
    }
}
