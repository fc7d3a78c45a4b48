/// Factory: build the configured authorization backend from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AccessController, BackendRegistry, RegistryError};

pub fn build_access_controller(
    config: &Config,
    registry: &BackendRegistry,
) -> Result<Arc<dyn AccessController>, RegistryError> {
    registry.build(&config.auth_backend, &config.auth_options)
}
