/*
 * Responsibility
 * - Read environment / .env (PORT, APP_ENV, AUTH_* and GITHUB_* settings)
 * - Assemble the options object handed to the selected authorization backend
 * - Fail fast on values that are present but unusable
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    // whole inbound request budget, outbound identity calls included
    pub http_timeout_seconds: u64,

    pub auth_backend: String,
    pub auth_options: Value,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let http_timeout_seconds = match env_string("HTTP_TIMEOUT_SECONDS") {
            Some(raw) => parse_seconds("HTTP_TIMEOUT_SECONDS", &raw)?,
            None => 30,
        };

        let auth_backend = std::env::var("AUTH_BACKEND")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "github".to_string());

        let auth_options = github_options_from_env()?;

        Ok(Self {
            addr,
            app_env,
            http_timeout_seconds,
            auth_backend,
            auth_options,
        })
    }
}

/// Only keys that are actually set end up in the object, so the backend's
/// own defaults apply to everything else.
fn github_options_from_env() -> Result<Value, ConfigError> {
    let mut options = Map::new();

    if let Some(realm) = env_string("AUTH_REALM") {
        options.insert("realm".into(), json!(realm));
    }
    if let Some(api_url) = env_string("GITHUB_API_URL") {
        options.insert("api_url".into(), json!(api_url));
    }
    if let Some(enabled) = env_string("GITHUB_ENABLE_OIDC") {
        let enabled = parse_bool(&enabled).ok_or(ConfigError::Invalid("GITHUB_ENABLE_OIDC"))?;
        options.insert("enable_oidc".into(), json!(enabled));
    }
    if let Some(audience) = env_string("GITHUB_OIDC_AUDIENCE") {
        options.insert("oidc_audience".into(), json!(audience));
    }
    if let Some(jwks_url) = env_string("GITHUB_OIDC_JWKS_URL") {
        options.insert("oidc_jwks_url".into(), json!(jwks_url));
    }
    if let Some(seconds) = env_string("GITHUB_TIMEOUT_SECONDS") {
        let seconds = parse_seconds("GITHUB_TIMEOUT_SECONDS", &seconds)?;
        options.insert("timeout_seconds".into(), json!(seconds));
    }

    let orgs = env_list("GITHUB_ALLOWED_ORGS");
    if !orgs.is_empty() {
        options.insert("allowed_orgs".into(), json!(orgs));
    }
    let repos = env_list("GITHUB_ALLOWED_REPOS");
    if !repos.is_empty() {
        options.insert("allowed_repos".into(), json!(repos));
    }

    Ok(Value::Object(options))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
}

/// Whole seconds, strictly positive.
fn parse_seconds(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>()
        .ok()
        .filter(|seconds| *seconds > 0)
        .ok_or(ConfigError::Invalid(key))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
