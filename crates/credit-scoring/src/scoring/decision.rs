use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::predictor::{BinaryPrediction, ModelRole, MultiClassPrediction, PredictorError};

pub const DECLINED_LABEL: &str = "Declined";

const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Scoring outcome returned to the caller. Parts a product does not produce
/// are omitted from the JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub approval: ApprovalPart,
    #[serde(rename = "loanAmount", skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<LoanAmountPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_message: Option<String>,
}

impl Decision {
    /// Terminal decline issued by the policy rules without consulting any model.
    pub fn policy_decline(reason: String) -> Self {
        Self {
            approval: ApprovalPart {
                label: DECLINED_LABEL.to_string(),
                prob_approved: 0.0,
                prob_declined: 1.0,
            },
            loan_amount: Some(LoanAmountPart {
                predicted_amount: 0.0,
            }),
            risk: None,
            policy_message: Some(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalPart {
    pub label: String,
    pub prob_approved: f64,
    pub prob_declined: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanAmountPart {
    pub predicted_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPart {
    pub label: String,
    #[serde(rename = "classProbabilities")]
    pub class_probabilities: ClassProbabilities,
}

/// Class label to probability, kept in the model's domain order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassProbabilities(Vec<(String, f64)>);

impl ClassProbabilities {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(candidate, _)| candidate == label)
            .map(|(_, probability)| *probability)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, probability) in &self.0 {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }
}

fn malformed(role: ModelRole, detail: String) -> PredictorError {
    PredictorError::MalformedOutput { role, detail }
}

fn is_probability(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

pub(crate) fn approval_part(prediction: BinaryPrediction) -> Result<ApprovalPart, PredictorError> {
    let [negative, positive] = prediction.class_probabilities;
    if !is_probability(negative) || !is_probability(positive) {
        return Err(malformed(
            ModelRole::Approval,
            format!("probabilities [{negative}, {positive}] fall outside [0, 1]"),
        ));
    }
    if (negative + positive - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(malformed(
            ModelRole::Approval,
            format!("probabilities [{negative}, {positive}] do not sum to 1"),
        ));
    }

    Ok(ApprovalPart {
        label: prediction.label,
        prob_approved: positive,
        prob_declined: negative,
    })
}

pub(crate) fn amount_part(value: f64) -> Result<LoanAmountPart, PredictorError> {
    if !value.is_finite() {
        return Err(malformed(
            ModelRole::Amount,
            format!("predicted amount {value} is not finite"),
        ));
    }
    Ok(LoanAmountPart {
        predicted_amount: value,
    })
}

/// Pairs each probability with the class label at the same position.
pub(crate) fn risk_part(
    prediction: MultiClassPrediction,
    class_domain: &[String],
) -> Result<RiskPart, PredictorError> {
    if prediction.class_probabilities.len() != class_domain.len() {
        return Err(malformed(
            ModelRole::Risk,
            format!(
                "{} probabilities for a domain of {} classes",
                prediction.class_probabilities.len(),
                class_domain.len()
            ),
        ));
    }
    if let Some(value) = prediction
        .class_probabilities
        .iter()
        .find(|value| !is_probability(**value))
    {
        return Err(malformed(
            ModelRole::Risk,
            format!("probability {value} falls outside [0, 1]"),
        ));
    }
    let total: f64 = prediction.class_probabilities.iter().sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(malformed(
            ModelRole::Risk,
            format!("probabilities sum to {total}, not 1"),
        ));
    }

    let class_probabilities = class_domain
        .iter()
        .cloned()
        .zip(prediction.class_probabilities)
        .collect();

    Ok(RiskPart {
        label: prediction.label,
        class_probabilities: ClassProbabilities(class_probabilities),
    })
}
