use serde_json::json;

use super::common::*;
use crate::prediction::{
    CohortEstimate, EvaluationRequest, ModelId, ModelRegistry, PredictionError,
    PredictionService, RiskLevel, RiskScheme,
};

#[test]
fn evaluate_returns_full_presentation_payload() {
    let request = EvaluationRequest {
        model_id: ANAMNESTIC,
        inputs: anamnestic_json(),
    };

    let response = service().evaluate(&request, today()).expect("evaluates");

    assert_eq!(response.model_id, ANAMNESTIC);
    assert_eq!(response.model_name, "Anamnestic Prediction Model");
    assert_close(response.probability, 0.2920);
    assert_eq!(response.probability_pct, "29.2%");
    assert_eq!(response.risk_level, Some(RiskLevel::Low));
    assert_eq!(response.risk_label, "Low");
    assert_eq!(response.cutoff, Some(0.5258));
    assert_eq!(response.cohort, CohortEstimate::Range { low: 15, high: 24 });
    assert!(response.cohort_interpretation.contains("between 15 and 24"));
}

#[test]
fn probability_just_below_cutoff_reports_half_row() {
    let inputs = anamnestic_inputs(50.0, "bulbar", "no");

    let response = service()
        .evaluate_inputs(ANAMNESTIC, &inputs, today())
        .expect("evaluates");

    assert!(response.probability > 0.5 && response.probability < 0.5258);
    assert_eq!(response.risk_level, Some(RiskLevel::Low));
    assert_eq!(response.cohort, CohortEstimate::Single { count: 48 });
}

#[test]
fn probability_just_above_cutoff_reports_point_six_row() {
    let inputs = anamnestic_inputs(52.0, "bulbar", "no");

    let response = service()
        .evaluate_inputs(ANAMNESTIC, &inputs, today())
        .expect("evaluates");

    assert!(response.probability > 0.5258 && response.probability < 0.6);
    assert_eq!(response.risk_level, Some(RiskLevel::High));
    assert!(response.risk_description.contains("specialist assessment"));
    assert_eq!(response.cohort, CohortEstimate::Single { count: 59 });
}

#[test]
fn string_values_are_coerced_by_field_kind() {
    let request = EvaluationRequest {
        model_id: NUTRITIONAL,
        inputs: nutritional_json(),
    };

    let response = service().evaluate(&request, today()).expect("evaluates");

    assert_close(response.probability, 0.7432);
    assert_eq!(response.risk_level, Some(RiskLevel::High));
    assert_eq!(response.cohort, CohortEstimate::Range { low: 74, high: 85 });
}

#[test]
fn missing_and_null_fields_are_reported() {
    let service = service();

    let mut inputs = anamnestic_json();
    inputs.remove("NIV_use");
    let result = service.evaluate(
        &EvaluationRequest {
            model_id: ANAMNESTIC,
            inputs,
        },
        today(),
    );
    assert_eq!(
        result,
        Err(PredictionError::MissingField {
            model: ANAMNESTIC,
            field: "NIV_use".to_string(),
        })
    );

    let mut inputs = anamnestic_json();
    inputs.insert("age".to_string(), serde_json::Value::Null);
    let result = service.evaluate(
        &EvaluationRequest {
            model_id: ANAMNESTIC,
            inputs,
        },
        today(),
    );
    assert!(matches!(
        result,
        Err(PredictionError::MissingField { ref field, .. }) if field == "age"
    ));
}

#[test]
fn malformed_values_are_invalid() {
    let service = service();
    let cases = [
        ("age", json!("fifty")),
        ("age", json!(true)),
        ("age", json!(150)),
        ("onset_site", json!("cervical")),
    ];

    for (field, value) in cases {
        let mut inputs = anamnestic_json();
        inputs.insert(field.to_string(), value.clone());
        let result = service.evaluate(
            &EvaluationRequest {
                model_id: ANAMNESTIC,
                inputs,
            },
            today(),
        );
        assert_eq!(
            result.as_ref().err().and_then(PredictionError::field),
            Some(field),
            "value {value} should be rejected"
        );
    }
}

#[test]
fn future_evaluation_date_is_invalid() {
    let mut inputs = nutritional_json();
    inputs.insert("evaluation_date".to_string(), json!("2031-01-01"));

    let result = service().evaluate(
        &EvaluationRequest {
            model_id: NUTRITIONAL,
            inputs,
        },
        today(),
    );

    assert!(matches!(
        result,
        Err(PredictionError::InvalidFieldValue { ref field, .. }) if field == "evaluation_date"
    ));
}

#[test]
fn unknown_model_is_reported_before_inputs() {
    let result = service().evaluate(
        &EvaluationRequest {
            model_id: ModelId(42),
            inputs: Default::default(),
        },
        today(),
    );

    assert_eq!(result, Err(PredictionError::UnknownModel(ModelId(42))));
}

#[test]
fn undeclared_keys_are_ignored() {
    let mut inputs = anamnestic_json();
    inputs.insert("visit_counter".to_string(), json!(12));

    let response = service()
        .evaluate(
            &EvaluationRequest {
                model_id: ANAMNESTIC,
                inputs,
            },
            today(),
        )
        .expect("extra keys do not fail");
    assert_close(response.probability, 0.2920);
}

#[test]
fn configured_scheme_flows_into_response() {
    let registry = ModelRegistry::standard().with_scheme(FUNCTIONAL, RiskScheme::default_bands());
    let service = PredictionService::new(registry);

    let response = service
        .evaluate_inputs(FUNCTIONAL, &functional_inputs(60.0, 10.0, 40.0), today())
        .expect("evaluates");

    assert_eq!(response.risk_level, Some(RiskLevel::Moderate));
    assert_eq!(response.risk_label, "Moderate");
}

#[test]
fn response_serializes_with_snake_case_keys() {
    let response = service()
        .evaluate_inputs(FUNCTIONAL, &functional_inputs(60.0, 10.0, 40.0), today())
        .expect("evaluates");

    let json = serde_json::to_value(&response).expect("serializes");
    assert_eq!(json["model_id"], 2);
    assert_eq!(json["risk_level"], "low");
    assert_eq!(json["risk_label"], "Low");
    assert_eq!(json["cohort"]["kind"], "range");
    assert_eq!(json["cohort"]["low"], 22);
    assert_eq!(json["cohort"]["high"], 35);
}

#[test]
fn shared_service_evaluates_from_many_threads() {
    let service = std::sync::Arc::new(service());
    let handles: Vec<_> = (0..4)
        .map(|offset| {
            let service = service.clone();
            std::thread::spawn(move || {
                let age = 40.0 + f64::from(offset);
                service
                    .evaluate_inputs(ANAMNESTIC, &anamnestic_inputs(age, "spinal", "no"), today())
                    .map(|response| response.probability)
            })
        })
        .collect();

    for handle in handles {
        let probability = handle.join().expect("thread completes").expect("evaluates");
        assert!((0.0..=1.0).contains(&probability));
    }
}
