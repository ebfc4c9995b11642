use secrecy::Secret;
use serde::Deserialize;
use service_core::config::{self as core_config, get_env, Environment};
use service_core::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub port: u16,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub identity: IdentityConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Present whenever `backend` is `Mongo`.
    pub mongodb: Option<MongoConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub jwt_secret: Secret<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secure_cookie: bool,
    pub inactivity_hours: i64,
}

impl ExpenseConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = Environment::current()?;
        let is_prod = environment.is_prod();

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let mongodb = match backend {
            StoreBackend::Mongo => Some(MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("expense_tracker"), is_prod)?,
            }),
            StoreBackend::Memory => None,
        };

        let config = ExpenseConfig {
            port: parse_setting(
                "EXPENSE_SERVICE_PORT",
                &get_env("EXPENSE_SERVICE_PORT", Some(&common.port.to_string()), false)?,
            )?,
            log_level: get_env("LOG_LEVEL", Some(&common.log_level), false)?,
            otlp_endpoint: optional_env("OTLP_ENDPOINT").or_else(|| common.otlp_endpoint.clone()),
            service_name: get_env("SERVICE_NAME", Some("expense-service"), false)?,
            store: StoreConfig { backend, mongodb },
            identity: IdentityConfig {
                jwt_secret: Secret::new(get_env(
                    "IDENTITY_JWT_SECRET",
                    Some("dev-identity-secret"),
                    is_prod,
                )?),
                issuer: optional_env("IDENTITY_ISSUER"),
                audience: optional_env("IDENTITY_AUDIENCE"),
            },
            session: SessionConfig {
                secure_cookie: parse_setting(
                    "SESSION_SECURE_COOKIE",
                    &get_env("SESSION_SECURE_COOKIE", Some("false"), is_prod)?,
                )?,
                inactivity_hours: parse_setting(
                    "SESSION_INACTIVITY_HOURS",
                    &get_env("SESSION_INACTIVITY_HOURS", Some("24"), false)?,
                )?,
            },
            environment,
            common,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "EXPENSE_SERVICE_PORT must be greater than 0"
            )));
        }

        if self.session.inactivity_hours <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_INACTIVITY_HOURS must be positive"
            )));
        }

        if self.environment.is_prod() {
            if self.store.backend == StoreBackend::Memory {
                tracing::warn!(
                    "In-memory store selected in production; data will not survive a restart"
                );
            }
            if !self.session.secure_cookie {
                tracing::warn!("Session cookie is not marked Secure in production");
            }
        }

        Ok(())
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e)))
}

/// Unset and blank values both read as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
