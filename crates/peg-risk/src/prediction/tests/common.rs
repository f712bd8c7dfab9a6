use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::prediction::{prediction_router, ModelId, PatientInputs, PredictionService};

pub(super) const ANAMNESTIC: ModelId = ModelId(1);
pub(super) const FUNCTIONAL: ModelId = ModelId(2);
pub(super) const NUTRITIONAL: ModelId = ModelId(3);

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2025, 6, 30)
}

pub(super) fn anamnestic_inputs(age: f64, onset: &str, niv: &str) -> PatientInputs {
    PatientInputs::new()
        .with("age", age)
        .with("onset_site", onset)
        .with("NIV_use", niv)
}

pub(super) fn functional_inputs(age: f64, bulbar_score: f64, fvc: f64) -> PatientInputs {
    PatientInputs::new()
        .with("age", age)
        .with("bulbar_score", bulbar_score)
        .with("fvc", fvc)
}

/// 10% weight loss over exactly four months.
pub(super) fn nutritional_inputs() -> PatientInputs {
    PatientInputs::new()
        .with("age", 60.0)
        .with("onset_site", "spinal")
        .with("NIV_use", "no")
        .with("bmi", 24.0)
        .with("pre_weight", 80.0)
        .with("post_weight", 72.0)
        .with("onset_date", date(2024, 1, 1))
        .with("evaluation_date", date(2024, 5, 1))
}

pub(super) fn anamnestic_json() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("age".to_string(), json!(50)),
        ("onset_site".to_string(), json!("spinal")),
        ("NIV_use".to_string(), json!("no")),
    ])
}

pub(super) fn nutritional_json() -> BTreeMap<String, Value> {
    BTreeMap::from([
        ("age".to_string(), json!("60")),
        ("onset_site".to_string(), json!("spinal")),
        ("NIV_use".to_string(), json!("no")),
        ("bmi".to_string(), json!(24.0)),
        ("pre_weight".to_string(), json!(80)),
        ("post_weight".to_string(), json!(72)),
        ("onset_date".to_string(), json!("2024-01-01")),
        ("evaluation_date".to_string(), json!("2024-05-01")),
    ])
}

pub(super) fn service() -> PredictionService {
    PredictionService::standard()
}

pub(super) fn router() -> axum::Router {
    prediction_router(Arc::new(service()))
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1.0e-4,
        "expected {expected}, got {actual}"
    );
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
