//! PEG placement risk prediction: model registry, interpretation engine, and the
//! service and HTTP surface that compose them.
//!
//! Every operation takes the model identifier explicitly. Registry and engine are
//! immutable once built and can be shared across threads behind an `Arc`.

pub mod batch;
pub mod domain;
pub mod interpretation;
pub mod registry;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use batch::{BatchEvaluator, BatchImportError, BatchOutcome};
pub use domain::{
    ChoiceOption, FieldKind, FieldSpec, FieldValue, ModelId, ModelSummary, PatientInputs,
};
pub use interpretation::{
    CohortEstimate, CohortTable, Decile, Interpretation, InterpretationEngine, RiskLevel,
    RiskScheme,
};
pub use registry::{ModelDefinition, ModelRegistry};
pub use router::prediction_router;
pub use service::{EvaluationRequest, EvaluationResponse, PredictionService};

/// Failures surfaced to callers of the registry, engine, and service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("unknown model {0}")]
    UnknownModel(ModelId),
    #[error("model {model} requires field '{field}'")]
    MissingField { model: ModelId, field: String },
    #[error("invalid value for '{field}': {reason}")]
    InvalidFieldValue { field: String, reason: String },
}

impl PredictionError {
    /// Field the error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            PredictionError::UnknownModel(_) => None,
            PredictionError::MissingField { field, .. }
            | PredictionError::InvalidFieldValue { field, .. } => Some(field),
        }
    }
}
