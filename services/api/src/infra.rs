use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use peg_risk::config::PredictionConfig;
use peg_risk::prediction::{ModelRegistry, PredictionService};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Standard registry with the configured per-model classification schemes applied.
pub(crate) fn prediction_service(config: &PredictionConfig) -> PredictionService {
    PredictionService::new(config.apply(ModelRegistry::standard()))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Parses a `field=value` pair given on the command line.
pub(crate) fn parse_input(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
