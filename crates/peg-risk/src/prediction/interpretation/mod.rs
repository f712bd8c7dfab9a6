mod cohort;
mod scheme;

pub use cohort::{
    estimate as estimate_cohort, CohortEntry, CohortEstimate, CohortTable, CohortTableError,
    Decile,
};
pub use scheme::{
    classify, point_estimate_description, RiskLevel, RiskScheme, MIDPOINT, UNCLASSIFIED_LABEL,
};

use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::ModelId;
use super::registry::ModelRegistry;
use super::PredictionError;

/// Per-model parameters the engine needs to annotate a probability.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpretationProfile {
    pub cutoff: Option<f64>,
    pub scheme: RiskScheme,
    pub cohort_table: CohortTable,
}

/// Classification plus cohort annotation of a single probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub risk_level: Option<RiskLevel>,
    pub risk_label: &'static str,
    pub risk_description: String,
    pub cohort: CohortEstimate,
    pub cohort_interpretation: String,
}

/// Stateless engine that classifies probabilities and maps them onto cohort tables.
#[derive(Debug, Clone, Default)]
pub struct InterpretationEngine {
    profiles: BTreeMap<ModelId, InterpretationProfile>,
}

impl InterpretationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registry(registry: &ModelRegistry) -> Self {
        let profiles = registry
            .definitions()
            .iter()
            .map(|definition| {
                (
                    definition.id,
                    InterpretationProfile {
                        cutoff: definition.cutoff,
                        scheme: definition.scheme,
                        cohort_table: definition.cohort_table.clone(),
                    },
                )
            })
            .collect();

        Self { profiles }
    }

    pub fn register(&mut self, model_id: ModelId, profile: InterpretationProfile) {
        self.profiles.insert(model_id, profile);
    }

    pub fn profile(&self, model_id: ModelId) -> Result<&InterpretationProfile, PredictionError> {
        self.profiles
            .get(&model_id)
            .ok_or(PredictionError::UnknownModel(model_id))
    }

    pub fn classify(
        &self,
        model_id: ModelId,
        probability: f64,
    ) -> Result<Option<RiskLevel>, PredictionError> {
        let profile = self.profile(model_id)?;
        Ok(classify(profile.scheme, profile.cutoff, probability))
    }

    pub fn cohort_estimate(
        &self,
        model_id: ModelId,
        probability: f64,
    ) -> Result<CohortEstimate, PredictionError> {
        let profile = self.profile(model_id)?;
        Ok(cohort::estimate(
            &profile.cohort_table,
            profile.cutoff,
            probability,
        ))
    }

    pub fn interpret(
        &self,
        model_id: ModelId,
        probability: f64,
    ) -> Result<Interpretation, PredictionError> {
        let risk_level = self.classify(model_id, probability)?;
        let cohort = self.cohort_estimate(model_id, probability)?;

        let (risk_label, risk_description) = match risk_level {
            Some(level) => (level.label(), level.description().to_string()),
            None => (UNCLASSIFIED_LABEL, point_estimate_description(probability)),
        };

        Ok(Interpretation {
            risk_level,
            risk_label,
            risk_description,
            cohort_interpretation: cohort.interpretation(),
            cohort,
        })
    }
}
