/*
 * Responsibility
 * - tracing + panic hook
 * - Config → backend registry → AppState → Router
 * - axum::serve()
 */
use std::{panic, process, time::Duration};

use anyhow::{Context, Result};
use axum::Router;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::auth::{BackendRegistry, build_access_controller};
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,registry_auth=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,registry_auth=debug,tower_http=info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // stderr can be hidden depending on how the process is launched
        tracing::error!(?info, "panic");

        // development: crash loudly; production: default hook, keep serving
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    // Sibling backends get registered here as well.
    let registry = BackendRegistry::with_builtin();
    tracing::debug!(available = ?registry.names(), "authorization backends registered");

    let state = build_state(&config, &registry)?;
    let app = build_router(state, &config);

    tracing::info!(
        "starting registry auth in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_state(config: &Config, registry: &BackendRegistry) -> Result<AppState> {
    let access = build_access_controller(config, registry)
        .with_context(|| format!("building authorization backend {:?}", config.auth_backend))?;

    Ok(AppState::new(
        access,
        config.auth_backend.as_str(),
        config.app_env,
    ))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let registry_api = middleware::auth::access::apply(api::v2::routes(), state.clone());

    let router = Router::new()
        .nest("/api/v1", api::v1::routes())
        .merge(registry_api)
        .with_state(state);

    middleware::http::apply(router, Duration::from_secs(config.http_timeout_seconds))
}
