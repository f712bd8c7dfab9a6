use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::prediction::router::{evaluate_handler, model_handler};

fn evaluate_request(model_id: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post(format!("/api/v1/models/{model_id}/evaluate"))
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("body serializes"),
        ))
        .expect("request builds")
}

#[tokio::test]
async fn list_route_returns_models_in_order() {
    let response = router()
        .oneshot(
            axum::http::Request::get("/api/v1/models")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let models = payload.as_array().expect("array payload");
    assert_eq!(models.len(), 3);
    assert_eq!(models[0]["id"], 1);
    assert_eq!(models[2]["name"], "Anamnestic and Nutritional Prediction Model");
    assert_eq!(models[1]["fields"][0]["id"], "age");
}

#[tokio::test]
async fn evaluate_route_returns_interpretation() {
    let response = router()
        .oneshot(evaluate_request(
            "1",
            json!({ "age": 50, "onset_site": "spinal", "NIV_use": "no" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let probability = payload["probability"].as_f64().expect("probability present");
    assert_close(probability, 0.2920);
    assert_eq!(payload["risk_label"], "Low");
    assert_eq!(payload["probability_pct"], "29.2%");
    assert!(payload["cohort_interpretation"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Out of 100 similar patients"));
}

#[tokio::test]
async fn evaluate_route_names_missing_field() {
    let response = router()
        .oneshot(evaluate_request("2", json!({ "age": 60, "fvc": 40 })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["field"], "bulbar_score");
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("bulbar_score"));
}

#[tokio::test]
async fn evaluate_route_rejects_out_of_range_value() {
    let response = router()
        .oneshot(evaluate_request(
            "2",
            json!({ "age": 60, "bulbar_score": 13, "fvc": 40 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["field"], "bulbar_score");
}

#[tokio::test]
async fn evaluate_route_returns_not_found_for_unknown_model() {
    let response = router()
        .oneshot(evaluate_request("4", json!({ "age": 60 })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload.get("field").is_none());
}

#[tokio::test]
async fn model_handler_rejects_non_numeric_ids() {
    let response = model_handler(State(Arc::new(service())), Path("abc".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "unknown model 'abc'");
}

#[tokio::test]
async fn evaluate_route_quotes_out_of_range_model_segment() {
    let response = router()
        .oneshot(evaluate_request("300", json!({ "age": 50 })))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], "unknown model '300'");
}

#[tokio::test]
async fn model_handler_returns_field_specs() {
    let response = model_handler(State(Arc::new(service())), Path("3".to_string())).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["id"], 3);
    assert_eq!(payload["fields"].as_array().map(Vec::len), Some(8));
    assert_eq!(payload["risk_scheme"], "cutoff");
}

#[tokio::test]
async fn evaluate_handler_accepts_string_encoded_form_values() {
    let response = evaluate_handler(
        State(Arc::new(service())),
        Path("3".to_string()),
        axum::Json(nutritional_json()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["risk_level"], "high");
}
