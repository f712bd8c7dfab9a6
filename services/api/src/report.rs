use crate::infra::{parse_date, parse_input, prediction_service};
use chrono::{Local, NaiveDate};
use clap::Args;
use peg_risk::config::AppConfig;
use peg_risk::error::AppError;
use peg_risk::prediction::{
    BatchEvaluator, BatchOutcome, EvaluationResponse, FieldKind, FieldSpec, ModelDefinition,
    ModelId, PatientInputs, PredictionError, PredictionService,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Model identifier (see `models`)
    #[arg(long)]
    pub(crate) model: u8,
    /// Patient input as FIELD=VALUE; repeat for every field of the model
    #[arg(long = "input", short = 'i', value_parser = parse_input)]
    pub(crate) inputs: Vec<(String, String)>,
    /// Reference date for date fields (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// Model identifier (see `models`)
    #[arg(long)]
    pub(crate) model: u8,
    /// CSV export whose headers match the model's field ids
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Reference date for date fields (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the outcomes as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_models() -> Result<(), AppError> {
    let service = configured_service()?;
    for definition in service.registry().definitions() {
        render_model(definition);
    }
    Ok(())
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        model,
        inputs,
        today,
        json,
    } = args;

    let model_id = ModelId(model);
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let service = configured_service()?;
    let definition = service.registry().get(model_id)?;
    let inputs = collect_inputs(definition, &inputs)?;
    let response = service.evaluate_inputs(model_id, &inputs, today)?;

    if json {
        print_json(&response)?;
    } else {
        render_response(&response);
    }
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let BatchArgs {
        model,
        csv,
        today,
        json,
    } = args;

    let model_id = ModelId(model);
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let service = configured_service()?;
    let outcomes = BatchEvaluator::from_path(&csv, &service, model_id, today)?;

    if json {
        print_json(&outcomes)?;
    } else {
        render_batch(model_id, &csv, &outcomes);
    }
    Ok(())
}

fn configured_service() -> Result<PredictionService, AppError> {
    let config = AppConfig::load()?;
    Ok(prediction_service(&config.prediction))
}

/// Parses `FIELD=VALUE` pairs with the model's field kinds.
fn collect_inputs(
    definition: &ModelDefinition,
    pairs: &[(String, String)],
) -> Result<PatientInputs, PredictionError> {
    let mut inputs = PatientInputs::new();
    for (key, raw) in pairs {
        let field = definition
            .fields
            .iter()
            .find(|field| field.id == key.as_str())
            .ok_or_else(|| PredictionError::InvalidFieldValue {
                field: key.clone(),
                reason: format!("not an input of model {}", definition.id),
            })?;
        inputs.insert(field.id, field.parse(raw)?);
    }
    Ok(inputs)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

fn render_model(definition: &ModelDefinition) {
    println!("Model {}: {}", definition.id, definition.name);
    match definition.cutoff {
        Some(cutoff) => println!(
            "  Classification: {} (cutoff {:.4})",
            definition.scheme.name(),
            cutoff
        ),
        None => println!("  Classification: {}", definition.scheme.name()),
    }
    println!("  Fields:");
    for field in &definition.fields {
        println!("    - {}", describe_field(field));
    }
    let cohort = definition
        .cohort_table
        .entries()
        .iter()
        .map(|entry| format!("{}%={}", u16::from(entry.decile.tenths()) * 10, entry.count))
        .collect::<Vec<_>>()
        .join(" ");
    println!("  Cohort table (per 100 patients): {cohort}");
}

fn describe_field(field: &FieldSpec) -> String {
    match &field.kind {
        FieldKind::Numeric { min, max, step } => {
            format!("{} ({}): number {min}..={max}, step {step}", field.id, field.label)
        }
        FieldKind::Choice { options } => {
            let values = options
                .iter()
                .map(|option| format!("{} [{}]", option.value, option.label))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} ({}): one of {values}", field.id, field.label)
        }
        FieldKind::Date { min, max } => {
            let upper = max
                .map(|max| max.to_string())
                .unwrap_or_else(|| "today".to_string());
            format!("{} ({}): date {min}..={upper}", field.id, field.label)
        }
    }
}

fn render_response(response: &EvaluationResponse) {
    println!("{} (model {})", response.model_name, response.model_id);
    println!(
        "- Probability of PEG within 6 months: {} ({:.4})",
        response.probability_pct, response.probability
    );
    match response.cutoff {
        Some(cutoff) => println!("- Risk: {} (cutoff {:.4})", response.risk_label, cutoff),
        None => println!("- Risk: {}", response.risk_label),
    }
    println!("  {}", response.risk_description);
    println!("  {}", response.cohort_interpretation);
}

fn render_batch(model_id: ModelId, csv: &std::path::Path, outcomes: &[BatchOutcome]) {
    let succeeded = outcomes.iter().filter(|outcome| outcome.is_success()).count();
    println!(
        "Batch evaluation of {} against model {model_id}: {succeeded}/{} rows scored",
        csv.display(),
        outcomes.len()
    );

    for outcome in outcomes {
        let label = match &outcome.patient_id {
            Some(patient_id) => format!("row {} [{patient_id}]", outcome.row),
            None => format!("row {}", outcome.row),
        };
        match (&outcome.response, &outcome.error) {
            (Some(response), _) => println!(
                "- {label}: {} | {} | {}",
                response.probability_pct, response.risk_label, response.cohort_interpretation
            ),
            (None, Some(error)) => println!("- {label}: rejected ({error})"),
            (None, None) => println!("- {label}: no result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
        values
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn collect_inputs_parses_with_field_kinds() {
        let service = PredictionService::standard();
        let definition = service.registry().get(ModelId(1)).expect("model 1");

        let inputs = collect_inputs(
            definition,
            &pairs(&[("age", "50"), ("onset_site", "spinal"), ("NIV_use", "no")]),
        )
        .expect("inputs parse");

        assert_eq!(inputs.len(), 3);
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date");
        let response = service
            .evaluate_inputs(ModelId(1), &inputs, today)
            .expect("evaluation succeeds");
        assert!((response.probability - 0.2920).abs() < 1e-4);
    }

    #[test]
    fn collect_inputs_rejects_undeclared_fields() {
        let service = PredictionService::standard();
        let definition = service.registry().get(ModelId(2)).expect("model 2");

        let error = collect_inputs(definition, &pairs(&[("onset_site", "bulbar")]))
            .expect_err("model 2 has no onset site");
        assert_eq!(error.field(), Some("onset_site"));
    }

    #[test]
    fn describe_field_renders_each_kind() {
        let service = PredictionService::standard();
        let definition = service.registry().get(ModelId(3)).expect("model 3");
        let rendered: Vec<String> = definition.fields.iter().map(describe_field).collect();

        assert!(rendered.iter().any(|line| line.contains("number")));
        assert!(rendered.iter().any(|line| line.contains("date 1990-01-01..=today")));
    }
}
