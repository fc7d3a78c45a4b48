/*
 * Responsibility
 * - Backend options surface (what configuration hands to the factory)
 * - AccessPolicy: validated, immutable view of those options
 *   - built once at startup, shared read-only via Arc
 */
use std::{collections::HashSet, time::Duration};

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw options accepted by the github backend.
///
/// Empty strings are treated as "unset".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BackendOptions {
    pub realm: Option<String>,
    pub api_url: Option<String>,
    #[serde(alias = "claims_enabled")]
    pub enable_oidc: bool,
    #[serde(alias = "expected_audience")]
    pub oidc_audience: Option<String>,
    pub allowed_orgs: Vec<String>,
    pub allowed_repos: Vec<String>,
    #[serde(alias = "jwks_url")]
    pub oidc_jwks_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AccessPolicy {
    realm: String,
    api_base: Url,
    // configured order, duplicates removed
    allowed_orgs: Vec<String>,
    allowed_repos: HashSet<String>,
    claims_enabled: bool,
    expected_audience: Option<String>,
    jwks_url: Option<Url>,
    request_timeout: Duration,
}

impl AccessPolicy {
    /// Policy with every optional field at its default.
    pub fn new(realm: impl Into<String>) -> Result<Self, ConfigError> {
        let realm = realm.into();
        if realm.trim().is_empty() {
            return Err(ConfigError::Missing("realm"));
        }

        Ok(Self {
            realm,
            api_base: parse_http_url(DEFAULT_API_URL, "api_url")?,
            allowed_orgs: Vec::new(),
            allowed_repos: HashSet::new(),
            claims_enabled: false,
            expected_audience: None,
            jwks_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn from_options(options: &Value) -> Result<Self, ConfigError> {
        let options = BackendOptions::deserialize(options)
            .map_err(|_| ConfigError::Invalid("options"))?;
        Self::from_backend_options(options)
    }

    pub fn from_backend_options(options: BackendOptions) -> Result<Self, ConfigError> {
        let realm = options.realm.ok_or(ConfigError::Missing("realm"))?;
        let mut policy = Self::new(realm)?
            .with_allowed_orgs(options.allowed_orgs)
            .with_allowed_repos(options.allowed_repos)
            .with_claims(options.enable_oidc, options.oidc_audience);

        if let Some(api_url) = non_empty(options.api_url) {
            policy = policy.with_api_url(&api_url)?;
        }
        if let Some(jwks_url) = non_empty(options.oidc_jwks_url) {
            policy = policy.with_jwks_url(&jwks_url)?;
        }
        if let Some(seconds) = options.timeout_seconds {
            if seconds == 0 {
                return Err(ConfigError::Invalid("timeout_seconds"));
            }
            policy = policy.with_request_timeout(Duration::from_secs(seconds));
        }

        Ok(policy)
    }

    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        self.api_base = parse_http_url(api_url.trim_end_matches('/'), "api_url")?;
        Ok(self)
    }

    pub fn with_allowed_orgs<I, S>(mut self, orgs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        self.allowed_orgs = orgs
            .into_iter()
            .map(Into::into)
            .filter(|org: &String| !org.is_empty() && seen.insert(org.clone()))
            .collect();
        self
    }

    pub fn with_allowed_repos<I, S>(mut self, repos: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_repos = repos
            .into_iter()
            .map(Into::into)
            .filter(|repo: &String| !repo.is_empty())
            .collect();
        self
    }

    pub fn with_claims(mut self, enabled: bool, expected_audience: Option<String>) -> Self {
        self.claims_enabled = enabled;
        self.expected_audience = non_empty(expected_audience);
        self
    }

    pub fn with_jwks_url(mut self, jwks_url: &str) -> Result<Self, ConfigError> {
        self.jwks_url = Some(parse_http_url(jwks_url, "oidc_jwks_url")?);
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    pub fn allowed_orgs(&self) -> &[String] {
        &self.allowed_orgs
    }

    pub fn claims_enabled(&self) -> bool {
        self.claims_enabled
    }

    pub fn expected_audience(&self) -> Option<&str> {
        self.expected_audience.as_deref()
    }

    pub fn jwks_url(&self) -> Option<&Url> {
        self.jwks_url.as_ref()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// An empty allow-list imposes no restriction.
    pub fn repository_allowed(&self, repository: &str) -> bool {
        self.allowed_repos.is_empty() || self.allowed_repos.contains(repository)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_http_url(raw: &str, key: &'static str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::Invalid(key))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigError::Invalid(key)),
    }
}
