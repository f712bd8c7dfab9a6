use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::prediction::{ModelId, ModelRegistry, RiskScheme};

const SCHEME_PREFIX: &str = "APP_MODEL_";
const SCHEME_SUFFIX: &str = "_SCHEME";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub prediction: PredictionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            prediction: PredictionConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Per-model classification overrides applied on top of the built-in registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionConfig {
    pub schemes: BTreeMap<ModelId, RiskScheme>,
}

impl PredictionConfig {
    /// Reads `APP_MODEL_<id>_SCHEME` overrides. Three-band splits come from
    /// `APP_BAND_MODERATE_PCT` and `APP_BAND_HIGH_PCT` (defaults 30 and 60).
    pub fn from_env() -> Result<Self, ConfigError> {
        let moderate_pct = percentage_var("APP_BAND_MODERATE_PCT", 30.0)?;
        let high_pct = percentage_var("APP_BAND_HIGH_PCT", 60.0)?;
        if moderate_pct >= high_pct {
            return Err(ConfigError::InvalidBands {
                moderate_pct,
                high_pct,
            });
        }

        let mut schemes = BTreeMap::new();
        for (key, value) in env::vars() {
            let Some(model_id) = key
                .strip_prefix(SCHEME_PREFIX)
                .and_then(|rest| rest.strip_suffix(SCHEME_SUFFIX))
            else {
                continue;
            };
            let model_id = model_id
                .parse::<u8>()
                .map(ModelId)
                .map_err(|_| ConfigError::InvalidScheme {
                    key: key.clone(),
                    value: value.clone(),
                })?;
            let scheme = parse_scheme(&value, moderate_pct, high_pct).ok_or_else(|| {
                ConfigError::InvalidScheme {
                    key: key.clone(),
                    value: value.clone(),
                }
            })?;
            schemes.insert(model_id, scheme);
        }

        Ok(Self { schemes })
    }

    /// Applies the overrides, ignoring ids the registry does not know.
    pub fn apply(&self, registry: ModelRegistry) -> ModelRegistry {
        self.schemes
            .iter()
            .fold(registry, |registry, (model_id, scheme)| {
                registry.with_scheme(*model_id, *scheme)
            })
    }
}

fn parse_scheme(value: &str, moderate_pct: f64, high_pct: f64) -> Option<RiskScheme> {
    match value.trim().to_ascii_lowercase().as_str() {
        "cutoff" => Some(RiskScheme::Cutoff),
        "midpoint" => Some(RiskScheme::Midpoint),
        "bands" | "three_band" | "three-band" => Some(RiskScheme::Bands {
            moderate_pct,
            high_pct,
        }),
        "point_estimate" | "none" => Some(RiskScheme::PointEstimate),
        _ => None,
    }
}

fn percentage_var(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| (0.0..=100.0).contains(value))
            .ok_or(ConfigError::InvalidPercentage { key }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidScheme { key: String, value: String },
    InvalidPercentage { key: &'static str },
    InvalidBands { moderate_pct: f64, high_pct: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidScheme { key, value } => write!(
                f,
                "{key}='{value}' must name a model id and one of cutoff, midpoint, bands, point_estimate"
            ),
            ConfigError::InvalidPercentage { key } => {
                write!(f, "{key} must be a percentage between 0 and 100")
            }
            ConfigError::InvalidBands {
                moderate_pct,
                high_pct,
            } => write!(
                f,
                "moderate band start ({moderate_pct}) must be below high band start ({high_pct})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidScheme { .. }
            | ConfigError::InvalidPercentage { .. }
            | ConfigError::InvalidBands { .. } => None,
        }
    }
}
