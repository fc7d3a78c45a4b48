use std::sync::Arc;

use async_trait::async_trait;
use registry_auth::config::ConfigError;
use registry_auth::services::auth::{
    AccessController, AuthError, BackendRegistry, Challenge, GITHUB_BACKEND, Grant, RegistryError,
    RequestContext,
};
use serde_json::{Value, json};

/// Lets everyone in as "anonymous".
struct OpenDoor;

#[async_trait]
impl AccessController for OpenDoor {
    fn realm(&self) -> &str {
        "open"
    }

    async fn authorized(
        &self,
        _ctx: &RequestContext,
        _authorization: Option<&str>,
    ) -> Result<Grant, Challenge> {
        Ok(Grant::new("anonymous"))
    }
}

fn open_door(_options: &Value) -> Result<Arc<dyn AccessController>, ConfigError> {
    Ok(Arc::new(OpenDoor))
}

#[test]
fn builtin_github_backend_is_available() {
    let registry = BackendRegistry::with_builtin();
    assert_eq!(registry.names(), [GITHUB_BACKEND]);

    let backend = registry
        .build(
            GITHUB_BACKEND,
            &json!({ "realm": "test-realm", "allowed_orgs": ["testorg"] }),
        )
        .expect("backend");
    assert_eq!(backend.realm(), "test-realm");
}

#[test]
fn missing_realm_is_a_construction_error() {
    let err = BackendRegistry::with_builtin()
        .build(GITHUB_BACKEND, &json!({ "api_url": "https://api.github.com" }))
        .err()
        .expect("construction error");

    assert!(matches!(
        err,
        RegistryError::Config {
            ref name,
            source: ConfigError::Missing("realm"),
        } if name == GITHUB_BACKEND
    ));
}

#[test]
fn invalid_api_url_is_a_construction_error() {
    let err = BackendRegistry::with_builtin()
        .build(
            GITHUB_BACKEND,
            &json!({ "realm": "r", "api_url": "::not a url::" }),
        )
        .err()
        .expect("construction error");

    assert!(matches!(
        err,
        RegistryError::Config {
            source: ConfigError::Invalid("api_url"),
            ..
        }
    ));
}

#[test]
fn unknown_backend_is_reported_by_name() {
    let err = BackendRegistry::with_builtin()
        .build("ldap", &json!({}))
        .err()
        .expect("construction error");

    assert!(matches!(err, RegistryError::UnknownBackend(ref name) if name == "ldap"));
    assert_eq!(err.to_string(), r#"unknown authorization backend "ldap""#);
}

#[test]
fn names_are_write_once() {
    let mut registry = BackendRegistry::with_builtin();

    let err = registry.register(GITHUB_BACKEND, open_door).unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyRegistered(ref name) if name == GITHUB_BACKEND));

    // the built-in factory is still the one in place
    assert!(registry.build(GITHUB_BACKEND, &json!({})).is_err());
}

#[tokio::test]
async fn sibling_backends_can_be_registered() {
    let mut registry = BackendRegistry::with_builtin();
    registry.register("open", open_door).expect("register");

    assert_eq!(registry.names(), ["github", "open"]);

    let backend = registry.build("open", &Value::Null).expect("backend");
    let grant = backend
        .authorized(&RequestContext::default(), None)
        .await
        .expect("grant");
    assert_eq!(grant.principal_name, "anonymous");
}

#[tokio::test]
async fn built_github_backend_challenges_with_its_realm() {
    let backend = BackendRegistry::with_builtin()
        .build(GITHUB_BACKEND, &json!({ "realm": "https://auth.example.com" }))
        .expect("backend");

    let challenge = backend
        .authorized(&RequestContext::default(), Some("Basic abc"))
        .await
        .err()
        .expect("challenge");

    assert_eq!(challenge.realm(), "https://auth.example.com");
    assert!(matches!(challenge.cause(), AuthError::MalformedCredential(_)));
}
