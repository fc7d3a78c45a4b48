/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - access: the authorization backend selected by configuration
 * - Cheap to clone (Arc inside); nothing here is mutated after startup
 */
use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};

use crate::config::AppEnv;
use crate::services::auth::AccessController;

#[derive(Clone)]
pub struct AppState {
    pub access: Arc<dyn AccessController>,
    pub backend: Arc<str>,
    pub app_env: AppEnv,
    pub started_at: DateTime<Utc>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("backend", &self.backend)
            .field("realm", &self.access.realm())
            .field("app_env", &self.app_env)
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl AppState {
    pub fn new(
        access: Arc<dyn AccessController>,
        backend: impl Into<Arc<str>>,
        app_env: AppEnv,
    ) -> Self {
        Self {
            access,
            backend: backend.into(),
            app_env,
            started_at: Utc::now(),
        }
    }
}
