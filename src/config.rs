use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::env;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEV_DEFAULT_JWT_SECRET: &str =
    "this_is_a_development_secret_key_that_is_at_least_64_characters_long_for_testing";

/// Application configuration, loaded from environment variables in the
/// teacher's layered `config` crate style. Only the knobs the reservation
/// core and its ambient stack actually consume are present; there is no
/// settings-file layering because the core has no feature surface large
/// enough to warrant per-environment TOML overlays.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    pub database_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_json: bool,

    #[validate(length(min = 32), custom = "validate_jwt_secret")]
    pub jwt_secret_key: String,

    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,

    #[serde(default = "default_jwt_access_token_ttl_minutes")]
    pub jwt_access_token_ttl_minutes: i64,

    #[serde(default = "default_reservation_ttl_seconds")]
    pub reservation_ttl_seconds: u64,

    #[serde(default = "default_reservation_warning_threshold_seconds")]
    pub reservation_warning_threshold_seconds: u64,

    #[serde(default = "default_expiration_interval_seconds")]
    pub expiration_interval_seconds: u64,

    #[serde(default = "default_true_bool")]
    pub enable_inprocess_expiration_job: bool,

    pub internal_expire_secret: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn is_test(&self) -> bool {
        self.environment.eq_ignore_ascii_case("test")
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.is_production() {
            return Ok(());
        }

        if self.jwt_secret_key.trim() == DEV_DEFAULT_JWT_SECRET {
            let mut err = ValidationError::new("jwt_secret_default_dev");
            err.message = Some(
                "The bundled development JWT secret must not be used in production. Set JWT_SECRET_KEY."
                    .into(),
            );
            errors.add("jwt_secret_key", err);
        }

        if self.internal_expire_secret.trim().is_empty() {
            let mut err = ValidationError::new("internal_expire_secret_required");
            err.message = Some("INTERNAL_EXPIRE_SECRET must be set in production".into());
            errors.add("internal_expire_secret", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}
fn default_jwt_access_token_ttl_minutes() -> i64 {
    60
}
fn default_reservation_ttl_seconds() -> u64 {
    120
}
fn default_reservation_warning_threshold_seconds() -> u64 {
    20
}
fn default_expiration_interval_seconds() -> u64 {
    30
}
fn default_true_bool() -> bool {
    true
}
fn default_db_max_connections() -> u32 {
    16
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn validate_jwt_secret(secret: &str) -> Result<(), ValidationError> {
    if secret.trim().len() < 32 {
        let mut err = ValidationError::new("jwt_secret_key");
        err.message = Some("JWT_SECRET_KEY must be at least 32 characters".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the configured log level as the default filter.
/// JSON output is used outside development, matching the teacher's
/// `config::init_tracing`.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("kitchensync={},tower_http=info", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration from environment variables. Database
/// connection details may be provided wholesale via `DATABASE_URL` or
/// assembled from `DB_*` parts, mirroring the original's
/// `_resolve_database_url`/`_build_database_url_from_parts`.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    let database_url = resolve_database_url();

    let builder = Config::builder()
        .set_default("database_url", database_url)?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("jwt_algorithm", default_jwt_algorithm())?
        .set_default(
            "jwt_access_token_ttl_minutes",
            default_jwt_access_token_ttl_minutes(),
        )?
        .set_default(
            "reservation_ttl_seconds",
            default_reservation_ttl_seconds() as i64,
        )?
        .set_default(
            "reservation_warning_threshold_seconds",
            default_reservation_warning_threshold_seconds() as i64,
        )?
        .set_default(
            "expiration_interval_seconds",
            default_expiration_interval_seconds() as i64,
        )?
        .set_default("enable_inprocess_expiration_job", true)?
        .set_default("internal_expire_secret", "")?
        .add_source(Environment::default().separator("__"));

    let config = builder.build()?;
    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

/// DATABASE_URL wins if set; otherwise assemble from DB_HOST/DB_PORT/DB_NAME/
/// DB_USER/DB_PASSWORD, preserving the original's part-assembly fallback.
fn resolve_database_url() -> String {
    if let Ok(url) = env::var("DATABASE_URL") {
        if !url.trim().is_empty() {
            return url;
        }
    }

    let host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
    let name = env::var("DB_NAME").unwrap_or_else(|_| "kitchensync".to_string());
    let user = env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = env::var("DB_PASSWORD").unwrap_or_default();

    format!("postgres://{user}:{password}@{host}:{port}/{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_secret_must_meet_minimum_length() {
        assert!(validate_jwt_secret("too-short").is_err());
        assert!(validate_jwt_secret(&"x".repeat(32)).is_ok());
    }
}
