use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde_json::{json, Value};
use tracing::warn;

use super::domain::ModelId;
use super::service::{EvaluationRequest, PredictionService};
use super::PredictionError;

/// Router builder exposing model metadata and evaluation endpoints.
pub fn prediction_router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/api/v1/models", get(list_handler))
        .route("/api/v1/models/:model_id", get(model_handler))
        .route("/api/v1/models/:model_id/evaluate", post(evaluate_handler))
        .with_state(service)
}

pub(crate) async fn list_handler(State(service): State<Arc<PredictionService>>) -> Response {
    (StatusCode::OK, Json(service.models())).into_response()
}

pub(crate) async fn model_handler(
    State(service): State<Arc<PredictionService>>,
    Path(model_id): Path<String>,
) -> Response {
    let model_id = match parse_model_id(&model_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match service.model(model_id) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn evaluate_handler(
    State(service): State<Arc<PredictionService>>,
    Path(model_id): Path<String>,
    Json(inputs): Json<BTreeMap<String, Value>>,
) -> Response {
    let model_id = match parse_model_id(&model_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let request = EvaluationRequest { model_id, inputs };
    let today = Local::now().date_naive();
    match service.evaluate(&request, today) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(error) => {
            warn!(model = %model_id, %error, "evaluation rejected");
            error_response(error)
        }
    }
}

/// Segments that are not a `u8` cannot name a registered model and get a 404
/// quoting the segment as sent.
fn parse_model_id(raw: &str) -> Result<ModelId, Response> {
    raw.trim().parse::<u8>().map(ModelId).map_err(|_| {
        warn!(model = raw, "model id is not numeric");
        let payload = json!({ "error": format!("unknown model '{raw}'") });
        (StatusCode::NOT_FOUND, Json(payload)).into_response()
    })
}

pub(crate) fn status_for(error: &PredictionError) -> StatusCode {
    match error {
        PredictionError::UnknownModel(_) => StatusCode::NOT_FOUND,
        PredictionError::MissingField { .. } | PredictionError::InvalidFieldValue { .. } => {
            StatusCode::BAD_REQUEST
        }
    }
}

fn error_response(error: PredictionError) -> Response {
    let status = status_for(&error);
    let payload = match error.field() {
        Some(field) => json!({ "error": error.to_string(), "field": field }),
        None => json!({ "error": error.to_string() }),
    };
    (status, Json(payload)).into_response()
}
