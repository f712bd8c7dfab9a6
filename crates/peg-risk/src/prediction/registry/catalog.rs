use chrono::NaiveDate;

use super::super::domain::{FieldSpec, ModelId};
use super::super::interpretation::{CohortTable, RiskScheme};
use super::formula::{
    AnamnesticCoefficients, Formula, FunctionalCoefficients, NutritionalCoefficients,
};
use super::ModelDefinition;

const ONSET_OPTIONS: &[(&str, &str)] = &[("bulbar", "Bulbar"), ("spinal", "Spinal")];
const YES_NO_OPTIONS: &[(&str, &str)] = &[("yes", "Yes"), ("no", "No")];

const ANAMNESTIC_TABLE: &[(u8, u8)] = &[
    (0, 3),
    (1, 8),
    (2, 15),
    (3, 24),
    (4, 36),
    (5, 48),
    (6, 59),
    (7, 70),
    (8, 81),
    (9, 90),
    (10, 97),
];

const FUNCTIONAL_TABLE: &[(u8, u8)] = &[
    (0, 4),
    (2, 14),
    (3, 22),
    (4, 35),
    (5, 46),
    (6, 61),
    (7, 72),
    (8, 80),
    (9, 88),
    (10, 95),
];

const NUTRITIONAL_TABLE: &[(u8, u8)] = &[
    (0, 2),
    (2, 11),
    (3, 25),
    (4, 37),
    (5, 50),
    (6, 63),
    (7, 74),
    (8, 85),
    (9, 85),
    (10, 96),
];

pub(super) fn standard_models() -> Vec<ModelDefinition> {
    vec![anamnestic(), functional(), nutritional()]
}

fn anamnestic() -> ModelDefinition {
    ModelDefinition {
        id: ModelId(1),
        name: "Anamnestic Prediction Model",
        fields: vec![
            age_field(),
            FieldSpec::choice("onset_site", "Site of Onset", ONSET_OPTIONS),
            FieldSpec::choice("NIV_use", "Use of NIV at Evaluation", YES_NO_OPTIONS),
        ],
        formula: Formula::Anamnestic(AnamnesticCoefficients {
            intercept: -2.9255,
            age: 0.0408,
            bulbar_onset: 0.9503,
            niv_use: 1.0346,
        }),
        cutoff: Some(0.5258),
        scheme: RiskScheme::Cutoff,
        cohort_table: table(ANAMNESTIC_TABLE),
    }
}

fn functional() -> ModelDefinition {
    ModelDefinition {
        id: ModelId(2),
        name: "Anamnestic and Functional Prediction Model",
        fields: vec![
            age_field(),
            FieldSpec::numeric("bulbar_score", "Bulbar Subscore", 0.0, 12.0),
            FieldSpec::stepped("fvc", "FVC%", 0.0, 150.0, 0.1),
        ],
        formula: Formula::Functional(FunctionalCoefficients {
            intercept: 3.3238,
            age: 0.0730,
            bulbar_score: -0.6943,
            fvc: -0.0317,
        }),
        cutoff: Some(0.5546),
        scheme: RiskScheme::Cutoff,
        cohort_table: table(FUNCTIONAL_TABLE),
    }
}

fn nutritional() -> ModelDefinition {
    ModelDefinition {
        id: ModelId(3),
        name: "Anamnestic and Nutritional Prediction Model",
        fields: vec![
            age_field(),
            FieldSpec::choice("onset_site", "Site of Onset", ONSET_OPTIONS),
            FieldSpec::choice("NIV_use", "Use of NIV at Evaluation", YES_NO_OPTIONS),
            FieldSpec::stepped("bmi", "BMI at Evaluation", 10.0, 50.0, 0.1),
            FieldSpec::numeric("pre_weight", "Premorbid Weight", 0.0, 150.0),
            FieldSpec::numeric("post_weight", "Weight at Evaluation", 0.0, 150.0),
            FieldSpec::date("onset_date", "Date of Symptom Onset", earliest_date()),
            FieldSpec::date("evaluation_date", "Date of Evaluation", earliest_date()),
        ],
        formula: Formula::Nutritional(NutritionalCoefficients {
            intercept: 0.9190,
            age: 0.0455,
            bulbar_onset: 0.7473,
            niv_use: 1.1234,
            bmi: -0.2014,
            weight_loss_rate: 0.8990,
        }),
        cutoff: Some(0.5412),
        scheme: RiskScheme::Cutoff,
        cohort_table: table(NUTRITIONAL_TABLE),
    }
}

fn age_field() -> FieldSpec {
    FieldSpec::numeric("age", "Age at Evaluation", 18.0, 100.0)
}

fn earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn table(rows: &'static [(u8, u8)]) -> CohortTable {
    CohortTable::from_static(rows)
}
