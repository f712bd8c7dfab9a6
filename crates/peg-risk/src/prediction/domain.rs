use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PredictionError;

/// Stable identifier of a registered prediction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(pub u8);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One selectable option of a single-choice field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChoiceOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// Semantic type of a form field together with its validation bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Numeric {
        min: f64,
        max: f64,
        step: f64,
    },
    Choice {
        options: Vec<ChoiceOption>,
    },
    Date {
        min: NaiveDate,
        /// `None` means the reference date of the request ("today").
        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<NaiveDate>,
    },
}

/// Declarative description of an input the presentation layer must collect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn numeric(id: &'static str, label: &'static str, min: f64, max: f64) -> Self {
        Self::stepped(id, label, min, max, 1.0)
    }

    pub fn stepped(id: &'static str, label: &'static str, min: f64, max: f64, step: f64) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Numeric { min, max, step },
        }
    }

    pub fn choice(
        id: &'static str,
        label: &'static str,
        options: &[(&'static str, &'static str)],
    ) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Choice {
                options: options
                    .iter()
                    .map(|&(value, label)| ChoiceOption { value, label })
                    .collect(),
            },
        }
    }

    pub fn date(id: &'static str, label: &'static str, min: NaiveDate) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Date { min, max: None },
        }
    }

    /// Coerces a raw JSON value into the typed value this field expects.
    pub fn coerce_json(&self, raw: &Value) -> Result<FieldValue, PredictionError> {
        match (&self.kind, raw) {
            (FieldKind::Numeric { .. }, Value::Number(number)) => number
                .as_f64()
                .map(FieldValue::Number)
                .ok_or_else(|| self.invalid("number is not representable as f64")),
            (_, Value::String(text)) => self.parse(text),
            (_, other) => Err(self.invalid(format!("unexpected JSON value {other}"))),
        }
    }

    /// Parses a textual value (CLI argument, CSV cell, form post) for this field.
    pub fn parse(&self, raw: &str) -> Result<FieldValue, PredictionError> {
        let trimmed = raw.trim();
        match &self.kind {
            FieldKind::Numeric { .. } => trimmed
                .parse::<f64>()
                .map(FieldValue::Number)
                .map_err(|_| self.invalid(format!("'{trimmed}' is not a number"))),
            FieldKind::Choice { .. } => Ok(FieldValue::Choice(trimmed.to_string())),
            FieldKind::Date { .. } => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| self.invalid(format!("'{trimmed}' is not a YYYY-MM-DD date"))),
        }
    }

    /// Checks kind and bounds of a supplied value.
    ///
    /// Date upper bounds are only enforced when a reference date is given.
    pub fn check(&self, value: &FieldValue, today: Option<NaiveDate>) -> Result<(), PredictionError> {
        match (&self.kind, value) {
            (FieldKind::Numeric { min, max, .. }, FieldValue::Number(number)) => {
                if !number.is_finite() {
                    return Err(self.invalid("value must be finite"));
                }
                if number < min || number > max {
                    return Err(self.invalid(format!("{number} outside [{min}, {max}]")));
                }
                Ok(())
            }
            (FieldKind::Choice { options }, FieldValue::Choice(choice)) => {
                if options.iter().any(|option| option.value == choice.as_str()) {
                    Ok(())
                } else {
                    let allowed: Vec<&str> = options.iter().map(|option| option.value).collect();
                    Err(self.invalid(format!(
                        "'{choice}' is not one of {}",
                        allowed.join(", ")
                    )))
                }
            }
            (FieldKind::Date { min, max }, FieldValue::Date(date)) => {
                if date < min {
                    return Err(self.invalid(format!("{date} is before {min}")));
                }
                if let Some(upper) = max.or(today) {
                    if *date > upper {
                        return Err(self.invalid(format!("{date} is after {upper}")));
                    }
                }
                Ok(())
            }
            (_, other) => Err(self.invalid(format!("{} value supplied", other.kind_label()))),
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> PredictionError {
        PredictionError::InvalidFieldValue {
            field: self.id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Typed value supplied for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Date(NaiveDate),
    Choice(String),
}

impl FieldValue {
    fn kind_label(&self) -> &'static str {
        match self {
            Self::Number(_) => "numeric",
            Self::Date(_) => "date",
            Self::Choice(_) => "choice",
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Choice(value.to_string())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Patient variables keyed by field id, built fresh for every evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientInputs(BTreeMap<String, FieldValue>);

impl PatientInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.0.insert(field.to_string(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn number(&self, field: &'static str) -> Result<f64, PredictionError> {
        match self.0.get(field) {
            Some(FieldValue::Number(value)) => Ok(*value),
            Some(_) => Err(wrong_kind(field, "numeric")),
            None => Err(missing(field)),
        }
    }

    pub(crate) fn flag(&self, field: &'static str, expected: &str) -> Result<f64, PredictionError> {
        match self.0.get(field) {
            Some(FieldValue::Choice(value)) => Ok(if value == expected { 1.0 } else { 0.0 }),
            Some(_) => Err(wrong_kind(field, "choice")),
            None => Err(missing(field)),
        }
    }

    pub(crate) fn date(&self, field: &'static str) -> Result<NaiveDate, PredictionError> {
        match self.0.get(field) {
            Some(FieldValue::Date(value)) => Ok(*value),
            Some(_) => Err(wrong_kind(field, "date")),
            None => Err(missing(field)),
        }
    }
}

impl FromIterator<(String, FieldValue)> for PatientInputs {
    fn from_iter<T: IntoIterator<Item = (String, FieldValue)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn wrong_kind(field: &str, expected: &str) -> PredictionError {
    PredictionError::InvalidFieldValue {
        field: field.to_string(),
        reason: format!("expected a {expected} value"),
    }
}

// Formulas only run after the registry checked presence, so the model id is not known here.
fn missing(field: &str) -> PredictionError {
    PredictionError::InvalidFieldValue {
        field: field.to_string(),
        reason: "value missing".to_string(),
    }
}

/// Presentation-facing view of a registered model used for form generation.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub id: ModelId,
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<f64>,
    pub risk_scheme: &'static str,
}
