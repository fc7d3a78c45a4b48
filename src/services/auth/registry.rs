/*
 * Responsibility
 * - Named authorization backends (name -> factory), filled once during app assembly
 * - Construction-time validation errors surface here and are fatal for startup
 */
use std::collections::{HashMap, hash_map::Entry};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::config::ConfigError;
use crate::services::auth::{AccessController, AccessPolicy, AuthorizationEngine};

pub const GITHUB_BACKEND: &str = "github";

/// Builds a backend from its options object.
pub type BackendFactory = fn(&Value) -> Result<Arc<dyn AccessController>, ConfigError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("authorization backend {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("unknown authorization backend {0:?}")]
    UnknownBackend(String),

    #[error("authorization backend {name:?} is misconfigured: {source}")]
    Config {
        name: String,
        #[source]
        source: ConfigError,
    },
}

#[derive(Debug, Default)]
pub struct BackendRegistry {
    factories: HashMap<String, BackendFactory>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every backend this crate ships.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert(GITHUB_BACKEND.to_string(), github_backend);
        registry
    }

    /// Names are write-once.
    pub fn register(&mut self, name: &str, factory: BackendFactory) -> Result<(), RegistryError> {
        match self.factories.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(factory);
                Ok(())
            }
        }
    }

    pub fn build(
        &self,
        name: &str,
        options: &Value,
    ) -> Result<Arc<dyn AccessController>, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownBackend(name.to_string()))?;

        let backend = factory(options).map_err(|source| RegistryError::Config {
            name: name.to_string(),
            source,
        })?;

        info!(backend = name, realm = backend.realm(), "authorization backend ready");
        Ok(backend)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Factory for the GitHub token / workflow identity backend.
pub fn github_backend(options: &Value) -> Result<Arc<dyn AccessController>, ConfigError> {
    let policy = AccessPolicy::from_options(options)?;
    Ok(Arc::new(AuthorizationEngine::from_policy(policy)?))
}
