use serde::{Deserialize, Serialize};

/// Fixed midpoint used by models classified without a learned cutoff.
pub const MIDPOINT: f64 = 0.5;

/// Discrete risk category reported back to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Low => {
                "The risk of needing a PEG in the next 6 months is low. Continue standard monitoring."
            }
            Self::Moderate => {
                "The risk of needing a PEG in the next 6 months is moderate. Closer nutritional and respiratory follow-up is advised."
            }
            Self::High => {
                "The risk of needing a PEG in the next 6 months is high. A specialist assessment is recommended."
            }
        }
    }
}

/// How a probability is turned into a [`RiskLevel`] for a given model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum RiskScheme {
    /// Two bands split at the model's learned cutoff.
    Cutoff,
    /// Two bands split at 0.5 regardless of the learned cutoff.
    Midpoint,
    /// Three bands on the percentage scale.
    Bands { moderate_pct: f64, high_pct: f64 },
    /// No category, the probability is reported as is.
    PointEstimate,
}

impl RiskScheme {
    pub const fn default_bands() -> Self {
        Self::Bands {
            moderate_pct: 30.0,
            high_pct: 60.0,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Cutoff => "cutoff",
            Self::Midpoint => "midpoint",
            Self::Bands { .. } => "bands",
            Self::PointEstimate => "point_estimate",
        }
    }
}

/// Classifies a probability. Values equal to a threshold fall into the higher band.
///
/// A [`RiskScheme::Cutoff`] without a learned cutoff behaves like
/// [`RiskScheme::PointEstimate`].
pub fn classify(scheme: RiskScheme, cutoff: Option<f64>, probability: f64) -> Option<RiskLevel> {
    match scheme {
        RiskScheme::Cutoff => cutoff.map(|threshold| two_band(probability, threshold)),
        RiskScheme::Midpoint => Some(two_band(probability, MIDPOINT)),
        RiskScheme::Bands {
            moderate_pct,
            high_pct,
        } => {
            Some(if probability >= high_pct / 100.0 {
                RiskLevel::High
            } else if probability >= moderate_pct / 100.0 {
                RiskLevel::Moderate
            } else {
                RiskLevel::Low
            })
        }
        RiskScheme::PointEstimate => None,
    }
}

fn two_band(probability: f64, threshold: f64) -> RiskLevel {
    if probability >= threshold {
        RiskLevel::High
    } else {
        RiskLevel::Low
    }
}

/// Label shown when a model has no categorical classification.
pub const UNCLASSIFIED_LABEL: &str = "Not classified";

pub fn point_estimate_description(probability: f64) -> String {
    format!(
        "The estimated probability of needing a PEG in the next 6 months is {:.1}%.",
        probability * 100.0
    )
}
