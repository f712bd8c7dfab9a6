mod catalog;
mod elapsed;
mod formula;

pub use elapsed::fractional_months;
pub use formula::{
    logistic, weight_loss_rate, AnamnesticCoefficients, Formula, FunctionalCoefficients,
    NutritionalCoefficients, LOGIT_CLAMP,
};

use chrono::NaiveDate;

use super::domain::{FieldSpec, ModelId, ModelSummary, PatientInputs};
use super::interpretation::{CohortTable, RiskScheme};
use super::PredictionError;

/// Immutable description of one prediction model and how to read its output.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    pub id: ModelId,
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
    pub formula: Formula,
    pub cutoff: Option<f64>,
    pub scheme: RiskScheme,
    pub cohort_table: CohortTable,
}

impl ModelDefinition {
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            id: self.id,
            name: self.name,
            fields: self.fields.clone(),
            cutoff: self.cutoff,
            risk_scheme: self.scheme.name(),
        }
    }

    /// Presence, kind, and bound checks for every declared field.
    ///
    /// Without a reference date, open-ended date bounds are left unchecked.
    pub fn validate(
        &self,
        inputs: &PatientInputs,
        today: Option<NaiveDate>,
    ) -> Result<(), PredictionError> {
        for field in &self.fields {
            let value = inputs
                .get(field.id)
                .ok_or_else(|| PredictionError::MissingField {
                    model: self.id,
                    field: field.id.to_string(),
                })?;
            field.check(value, today)?;
        }
        Ok(())
    }

    pub fn evaluate(&self, inputs: &PatientInputs) -> Result<f64, PredictionError> {
        self.validate(inputs, None)?;
        self.formula.probability(inputs)
    }
}

/// Ordered, read-only collection of model definitions.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    definitions: Vec<ModelDefinition>,
}

impl ModelRegistry {
    /// The three reference PEG models.
    pub fn standard() -> Self {
        Self {
            definitions: catalog::standard_models(),
        }
    }

    pub fn from_definitions(definitions: Vec<ModelDefinition>) -> Self {
        Self { definitions }
    }

    /// Replaces the classification scheme of a model, leaving everything else intact.
    pub fn with_scheme(mut self, model_id: ModelId, scheme: RiskScheme) -> Self {
        if let Some(definition) = self
            .definitions
            .iter_mut()
            .find(|definition| definition.id == model_id)
        {
            definition.scheme = scheme;
        }
        self
    }

    pub fn definitions(&self) -> &[ModelDefinition] {
        &self.definitions
    }

    pub fn list_models(&self) -> Vec<ModelSummary> {
        self.definitions
            .iter()
            .map(ModelDefinition::summary)
            .collect()
    }

    pub fn get(&self, model_id: ModelId) -> Result<&ModelDefinition, PredictionError> {
        self.definitions
            .iter()
            .find(|definition| definition.id == model_id)
            .ok_or(PredictionError::UnknownModel(model_id))
    }

    pub fn validate(
        &self,
        model_id: ModelId,
        inputs: &PatientInputs,
        today: NaiveDate,
    ) -> Result<(), PredictionError> {
        self.get(model_id)?.validate(inputs, Some(today))
    }

    pub fn evaluate(&self, model_id: ModelId, inputs: &PatientInputs) -> Result<f64, PredictionError> {
        self.get(model_id)?.evaluate(inputs)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
