use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

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
    pub models: ModelPaths,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let model_dir = env::var("APP_MODEL_DIR").unwrap_or_else(|_| "models".to_string());
        let models = ModelPaths::resolve(Path::new(&model_dir))?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            models,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Locations of the model artifacts backing each product.
///
/// Every path defaults to a file inside `APP_MODEL_DIR` and can be overridden
/// individually. The mortgage risk model is optional: it is only configured
/// when its variable is set or the default file exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub mortgage_approval: PathBuf,
    pub mortgage_amount: PathBuf,
    pub mortgage_risk: Option<PathBuf>,
    pub credit_card_approval: PathBuf,
    pub credit_card_limit: PathBuf,
    pub loan_approval: PathBuf,
    pub loan_amount: PathBuf,
    pub current_account_approval: PathBuf,
}

impl ModelPaths {
    fn resolve(model_dir: &Path) -> Result<Self, ConfigError> {
        let path = |var: &str, file: &str| -> Result<PathBuf, ConfigError> {
            match env::var(var) {
                Ok(value) if value.trim().is_empty() => Err(ConfigError::EmptyModelPath {
                    variable: var.to_string(),
                }),
                Ok(value) => Ok(PathBuf::from(value)),
                Err(_) => Ok(model_dir.join(file)),
            }
        };

        let mortgage_risk = match env::var("MODEL_MORTGAGE_RISK_PATH") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(PathBuf::from(value)),
            Err(_) => {
                let default = model_dir.join("mortgage_risk.json");
                default.exists().then_some(default)
            }
        };

        Ok(Self {
            mortgage_approval: path("MODEL_MORTGAGE_APPROVAL_PATH", "mortgage_approval.json")?,
            mortgage_amount: path("MODEL_MORTGAGE_AMOUNT_PATH", "mortgage_amount.json")?,
            mortgage_risk,
            credit_card_approval: path(
                "MODEL_CREDIT_CARD_APPROVAL_PATH",
                "credit_card_approval.json",
            )?,
            credit_card_limit: path("MODEL_CREDIT_CARD_LIMIT_PATH", "credit_card_limit.json")?,
            loan_approval: path("MODEL_LOAN_APPROVAL_PATH", "loan_approval.json")?,
            loan_amount: path("MODEL_LOAN_AMOUNT_PATH", "loan_amount.json")?,
            current_account_approval: path(
                "MODEL_CURRENT_ACCOUNT_APPROVAL_PATH",
                "current_account_approval.json",
            )?,
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyModelPath { variable: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyModelPath { variable } => {
                write!(f, "{variable} is set but empty")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::EmptyModelPath { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
