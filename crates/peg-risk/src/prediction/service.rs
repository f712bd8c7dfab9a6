use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::domain::{ModelId, ModelSummary, PatientInputs};
use super::interpretation::{CohortEstimate, InterpretationEngine, RiskLevel};
use super::registry::ModelRegistry;
use super::PredictionError;

/// Raw request as received from a form post or JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub model_id: ModelId,
    pub inputs: BTreeMap<String, Value>,
}

/// Everything the presentation layer needs to render a result card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResponse {
    pub model_id: ModelId,
    pub model_name: &'static str,
    pub probability: f64,
    pub probability_pct: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    pub risk_label: &'static str,
    pub risk_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
    pub cohort: CohortEstimate,
    pub cohort_interpretation: String,
}

/// Service composing the model registry and the interpretation engine.
#[derive(Debug, Clone)]
pub struct PredictionService {
    registry: Arc<ModelRegistry>,
    engine: Arc<InterpretationEngine>,
}

impl PredictionService {
    pub fn new(registry: ModelRegistry) -> Self {
        let engine = InterpretationEngine::from_registry(&registry);
        Self::with_engine(registry, engine)
    }

    pub fn with_engine(registry: ModelRegistry, engine: InterpretationEngine) -> Self {
        Self {
            registry: Arc::new(registry),
            engine: Arc::new(engine),
        }
    }

    pub fn standard() -> Self {
        Self::new(ModelRegistry::standard())
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn engine(&self) -> &InterpretationEngine {
        &self.engine
    }

    pub fn models(&self) -> Vec<ModelSummary> {
        self.registry.list_models()
    }

    pub fn model(&self, model_id: ModelId) -> Result<ModelSummary, PredictionError> {
        self.registry.get(model_id).map(|definition| definition.summary())
    }

    /// Coerces raw JSON values into typed inputs using the model's field kinds.
    ///
    /// Keys the model does not declare are ignored.
    pub fn coerce(
        &self,
        model_id: ModelId,
        raw: &BTreeMap<String, Value>,
    ) -> Result<PatientInputs, PredictionError> {
        let definition = self.registry.get(model_id)?;
        let mut inputs = PatientInputs::new();

        for field in &definition.fields {
            let value = raw
                .get(field.id)
                .filter(|value| !value.is_null())
                .ok_or_else(|| PredictionError::MissingField {
                    model: model_id,
                    field: field.id.to_string(),
                })?;
            inputs.insert(field.id, field.coerce_json(value)?);
        }

        let ignored = raw
            .keys()
            .filter(|key| !inputs.contains(key.as_str()))
            .count();
        if ignored > 0 {
            debug!(model = %model_id, ignored, "ignoring undeclared input fields");
        }

        Ok(inputs)
    }

    pub fn evaluate(
        &self,
        request: &EvaluationRequest,
        today: NaiveDate,
    ) -> Result<EvaluationResponse, PredictionError> {
        let inputs = self.coerce(request.model_id, &request.inputs)?;
        self.evaluate_inputs(request.model_id, &inputs, today)
    }

    /// Validates typed inputs against `today`, evaluates, and interprets the probability.
    pub fn evaluate_inputs(
        &self,
        model_id: ModelId,
        inputs: &PatientInputs,
        today: NaiveDate,
    ) -> Result<EvaluationResponse, PredictionError> {
        let definition = self.registry.get(model_id)?;
        definition.validate(inputs, Some(today))?;

        let probability = definition.evaluate(inputs)?;
        let interpretation = self.engine.interpret(model_id, probability)?;

        debug!(
            model = %model_id,
            probability,
            risk = interpretation.risk_label,
            "evaluated PEG risk"
        );

        Ok(EvaluationResponse {
            model_id,
            model_name: definition.name,
            probability,
            probability_pct: format!("{:.1}%", probability * 100.0),
            risk_level: interpretation.risk_level,
            risk_label: interpretation.risk_label,
            risk_description: interpretation.risk_description,
            cutoff: definition.cutoff,
            cohort: interpretation.cohort,
            cohort_interpretation: interpretation.cohort_interpretation,
        })
    }
}

impl Default for PredictionService {
    fn default() -> Self {
        Self::standard()
    }
}
