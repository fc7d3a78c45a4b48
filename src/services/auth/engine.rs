/*
 * Responsibility
 * - Verification strategies behind one capability trait (CredentialVerifier)
 * - AuthorizationEngine: try strategies in priority order, first success wins
 * - AccessController: what the HTTP layer talks to (header in, Grant/Challenge out)
 *
 * Notes
 * - Every per-request failure leaves the engine as a Challenge carrying the realm.
 * - No per-request state is shared; the policy is read-only behind Arc.
 */
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::ConfigError;
use crate::services::auth::{
    AccessPolicy, AuthError, Challenge, ClaimsVerifier, Credential, Grant,
    RemoteIdentityVerifier, build_http_client, extract_credential,
};

/// One way of turning a credential into a principal.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    async fn verify(&self, credential: &Credential) -> Result<Grant, AuthError>;
}

/// Per-request data the engine uses for log correlation.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: Some(request_id.into()),
        }
    }
}

/// A named authorization backend as seen by the HTTP layer.
#[async_trait]
pub trait AccessController: Send + Sync {
    fn realm(&self) -> &str;

    /// `authorization` is the raw `Authorization` header value, if any.
    async fn authorized(
        &self,
        ctx: &RequestContext,
        authorization: Option<&str>,
    ) -> Result<Grant, Challenge>;
}

pub struct AuthorizationEngine {
    realm: Arc<str>,
    verifiers: Vec<Arc<dyn CredentialVerifier>>,
}

impl std::fmt::Debug for AuthorizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.verifiers.iter().map(|v| v.name()).collect();
        f.debug_struct("AuthorizationEngine")
            .field("realm", &self.realm)
            .field("verifiers", &names)
            .finish()
    }
}

impl AuthorizationEngine {
    /// `verifiers` are tried in the given order.
    pub fn new(realm: impl Into<Arc<str>>, verifiers: Vec<Arc<dyn CredentialVerifier>>) -> Self {
        Self {
            realm: realm.into(),
            verifiers,
        }
    }

    /// Claims verification first when enabled, the identity API always last.
    pub fn from_policy(policy: AccessPolicy) -> Result<Self, ConfigError> {
        let policy = Arc::new(policy);
        let client = build_http_client(&policy)?;

        let mut verifiers: Vec<Arc<dyn CredentialVerifier>> = Vec::with_capacity(2);
        if policy.claims_enabled() {
            verifiers.push(Arc::new(ClaimsVerifier::new(policy.clone(), client.clone())));
        }
        verifiers.push(Arc::new(RemoteIdentityVerifier::new(policy.clone(), client)));

        Ok(Self::new(policy.realm(), verifiers))
    }

    pub async fn authorize(
        &self,
        ctx: &RequestContext,
        credential: &Credential,
    ) -> Result<Grant, Challenge> {
        let span = info_span!(
            "authorize",
            request_id = ctx.request_id.as_deref().unwrap_or("-"),
            fingerprint = %credential.fingerprint(),
        );

        async {
            let mut last_error = AuthError::MissingCredential;
            for verifier in &self.verifiers {
                match verifier.verify(credential).await {
                    Ok(grant) => {
                        info!(
                            principal = %grant.principal_name,
                            verifier = verifier.name(),
                            "request authorized"
                        );
                        return Ok(grant);
                    }
                    Err(err) => {
                        debug!(verifier = verifier.name(), error = %err, "verifier declined");
                        last_error = err;
                    }
                }
            }

            warn!(error = %last_error, "request not authorized");
            Err(self.challenge(last_error))
        }
        .instrument(span)
        .await
    }

    fn challenge(&self, cause: AuthError) -> Challenge {
        Challenge::new(self.realm.clone(), cause)
    }
}

#[async_trait]
impl AccessController for AuthorizationEngine {
    fn realm(&self) -> &str {
        &self.realm
    }

    async fn authorized(
        &self,
        ctx: &RequestContext,
        authorization: Option<&str>,
    ) -> Result<Grant, Challenge> {
        let credential = extract_credential(authorization).map_err(|err| {
            warn!(
                request_id = ctx.request_id.as_deref().unwrap_or("-"),
                error = %err,
                "unusable authorization header"
            );
            self.challenge(err)
        })?;

        self.authorize(ctx, &credential).await
    }
}
