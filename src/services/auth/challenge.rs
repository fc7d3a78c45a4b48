//! Authorization outcome types.
//!
//! `Grant` is what a successful check hands back to the registry; `Challenge`
//! is the failure value that also carries what the HTTP layer needs to build a
//! `WWW-Authenticate` header.
use std::sync::Arc;

use thiserror::Error;

use super::AuthError;

/// Service identifier advertised in every challenge.
pub const CHALLENGE_SERVICE: &str = "registry";

/// Successful authorization: the acting identity for later scope checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub principal_name: String,
}

impl Grant {
    pub fn new(principal_name: impl Into<String>) -> Self {
        Self {
            principal_name: principal_name.into(),
        }
    }
}

/// Failed authorization.
///
/// Display never includes the cause: only the realm is visible to callers.
#[derive(Debug, Clone, Error)]
#[error("authentication required (realm \"{realm}\")")]
pub struct Challenge {
    realm: Arc<str>,
    #[source]
    cause: AuthError,
}

impl Challenge {
    pub fn new(realm: impl Into<Arc<str>>, cause: AuthError) -> Self {
        Self {
            realm: realm.into(),
            cause,
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub fn service(&self) -> &'static str {
        CHALLENGE_SERVICE
    }

    pub fn cause(&self) -> &AuthError {
        &self.cause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_the_cause() {
        let challenge = Challenge::new(
            "registry.example.com",
            AuthError::RepositoryNotAllowed("acme/secret".into()),
        );

        let message = challenge.to_string();
        assert_eq!(
            message,
            "authentication required (realm \"registry.example.com\")"
        );
        assert!(!message.contains("acme/secret"));
        assert_eq!(challenge.service(), "registry");
    }
}
