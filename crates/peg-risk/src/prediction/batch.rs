use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ModelId, PatientInputs};
use super::service::{EvaluationResponse, PredictionService};
use super::PredictionError;

/// Optional column carrying a caller-side identifier for each row.
pub const PATIENT_ID_COLUMN: &str = "patient_id";

#[derive(Debug, thiserror::Error)]
pub enum BatchImportError {
    #[error("failed to read patient export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid patient CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("patient export lacks a '{column}' column required by model {model}")]
    MissingColumn { model: ModelId, column: String },
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// Result of evaluating one CSV row. Row numbers are 1-based and exclude the header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<EvaluationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.response.is_some()
    }

    fn rejected(row: usize, patient_id: Option<String>, error: String) -> Self {
        Self {
            row,
            patient_id,
            response: None,
            error: Some(error),
        }
    }
}

/// Evaluates every row of a CSV export against one model.
pub struct BatchEvaluator;

impl BatchEvaluator {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        service: &PredictionService,
        model_id: ModelId,
        today: NaiveDate,
    ) -> Result<Vec<BatchOutcome>, BatchImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, service, model_id, today)
    }

    /// Header names must match field ids. Rows may be short or long; rows that
    /// fail to decode, parse, or evaluate are reported individually and do not
    /// stop the batch. Only header and I/O failures abort the import.
    pub fn from_reader<R: Read>(
        reader: R,
        service: &PredictionService,
        model_id: ModelId,
        today: NaiveDate,
    ) -> Result<Vec<BatchOutcome>, BatchImportError> {
        let definition = service.registry().get(model_id)?;
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut columns = Vec::with_capacity(definition.fields.len());
        for field in &definition.fields {
            let index = headers
                .iter()
                .position(|header| header == field.id)
                .ok_or_else(|| BatchImportError::MissingColumn {
                    model: model_id,
                    column: field.id.to_string(),
                })?;
            columns.push((field, index));
        }
        let id_column = headers
            .iter()
            .position(|header| header == PATIENT_ID_COLUMN);

        let mut outcomes = Vec::new();
        for (offset, record) in csv_reader.records().enumerate() {
            let row = offset + 1;
            let record = match record {
                Ok(record) => record,
                Err(error) if error.is_io_error() => return Err(error.into()),
                Err(error) => {
                    warn!(model = %model_id, row, %error, "batch row unreadable");
                    outcomes.push(BatchOutcome::rejected(row, None, error.to_string()));
                    continue;
                }
            };
            let patient_id = id_column
                .and_then(|index| record.get(index))
                .filter(|value| !value.is_empty())
                .map(str::to_string);

            let evaluated = columns
                .iter()
                .try_fold(PatientInputs::new(), |mut inputs, (field, index)| {
                    let cell = record.get(*index).unwrap_or_default();
                    if cell.is_empty() {
                        return Err(PredictionError::MissingField {
                            model: model_id,
                            field: field.id.to_string(),
                        });
                    }
                    inputs.insert(field.id, field.parse(cell)?);
                    Ok(inputs)
                })
                .and_then(|inputs| service.evaluate_inputs(model_id, &inputs, today));

            let outcome = match evaluated {
                Ok(response) => BatchOutcome {
                    row,
                    patient_id,
                    response: Some(response),
                    error: None,
                },
                Err(error) => {
                    warn!(model = %model_id, row, %error, "batch row rejected");
                    BatchOutcome::rejected(row, patient_id, error.to_string())
                }
            };
            outcomes.push(outcome);
        }

        let succeeded = outcomes.iter().filter(|outcome| outcome.is_success()).count();
        info!(
            model = %model_id,
            rows = outcomes.len(),
            succeeded,
            "batch evaluation finished"
        );

        Ok(outcomes)
    }
}
