use serde::Serialize;

use super::super::domain::PatientInputs;
use super::super::PredictionError;
use super::elapsed::fractional_months;

/// Logits beyond this magnitude saturate the logistic function in f64 anyway.
pub const LOGIT_CLAMP: f64 = 40.0;

/// Coefficients of the anamnestic model (age, site of onset, NIV use).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnamnesticCoefficients {
    pub intercept: f64,
    pub age: f64,
    pub bulbar_onset: f64,
    pub niv_use: f64,
}

/// Coefficients of the anamnestic and functional model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FunctionalCoefficients {
    pub intercept: f64,
    pub age: f64,
    pub bulbar_score: f64,
    pub fvc: f64,
}

/// Coefficients of the anamnestic and nutritional model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutritionalCoefficients {
    pub intercept: f64,
    pub age: f64,
    pub bulbar_onset: f64,
    pub niv_use: f64,
    pub bmi: f64,
    pub weight_loss_rate: f64,
}

/// Closed-form linear predictor of a model. Coefficients are opaque data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Formula {
    Anamnestic(AnamnesticCoefficients),
    Functional(FunctionalCoefficients),
    Nutritional(NutritionalCoefficients),
}

impl Formula {
    pub fn logit(&self, inputs: &PatientInputs) -> Result<f64, PredictionError> {
        match self {
            Formula::Anamnestic(beta) => Ok(beta.intercept
                + beta.age * inputs.number("age")?
                + beta.bulbar_onset * inputs.flag("onset_site", "bulbar")?
                + beta.niv_use * inputs.flag("NIV_use", "yes")?),
            Formula::Functional(beta) => Ok(beta.intercept
                + beta.age * inputs.number("age")?
                + beta.bulbar_score * inputs.number("bulbar_score")?
                + beta.fvc * inputs.number("fvc")?),
            Formula::Nutritional(beta) => Ok(beta.intercept
                + beta.age * inputs.number("age")?
                + beta.bulbar_onset * inputs.flag("onset_site", "bulbar")?
                + beta.niv_use * inputs.flag("NIV_use", "yes")?
                + beta.bmi * inputs.number("bmi")?
                + beta.weight_loss_rate * weight_loss_rate(inputs)?),
        }
    }

    pub fn probability(&self, inputs: &PatientInputs) -> Result<f64, PredictionError> {
        self.logit(inputs).map(logistic)
    }
}

/// Logistic transform with the logit clamped to `±LOGIT_CLAMP`.
pub fn logistic(logit: f64) -> f64 {
    let bounded = logit.clamp(-LOGIT_CLAMP, LOGIT_CLAMP);
    1.0 / (1.0 + (-bounded).exp())
}

/// Percentage of premorbid weight lost per month elapsed since symptom onset.
pub fn weight_loss_rate(inputs: &PatientInputs) -> Result<f64, PredictionError> {
    let pre_weight = inputs.number("pre_weight")?;
    let post_weight = inputs.number("post_weight")?;
    if pre_weight <= 0.0 {
        return Err(PredictionError::InvalidFieldValue {
            field: "pre_weight".to_string(),
            reason: "premorbid weight must be positive".to_string(),
        });
    }

    let onset = inputs.date("onset_date")?;
    let evaluation = inputs.date("evaluation_date")?;
    let months = fractional_months(onset, evaluation);
    if months <= 0.0 {
        return Err(PredictionError::InvalidFieldValue {
            field: "evaluation_date".to_string(),
            reason: format!("must fall at least a tenth of a month after onset ({onset})"),
        });
    }

    let percent_lost = (pre_weight - post_weight) / pre_weight * 100.0;
    Ok(percent_lost / months)
}
