use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{ClaimsPayload, KeySetCache};
use crate::services::auth::{AccessPolicy, AuthError, Credential, CredentialVerifier, Grant};

/// Local verification of self-contained workflow identity tokens.
///
/// Without a configured key set only the payload is decoded; see `KeySetCache`.
#[derive(Debug)]
pub struct ClaimsVerifier {
    policy: Arc<AccessPolicy>,
    keys: Option<KeySetCache>,
}

impl ClaimsVerifier {
    pub fn new(policy: Arc<AccessPolicy>, client: reqwest::Client) -> Self {
        let keys = policy
            .jwks_url()
            .map(|url| KeySetCache::new(url.clone(), client));
        Self { policy, keys }
    }

    pub async fn verify_token(&self, token: &str) -> Result<ClaimsPayload, AuthError> {
        let payload = ClaimsPayload::from_token(token)?;
        if let Some(keys) = &self.keys {
            keys.verify(token).await?;
        }
        check_claims(&self.policy, &payload, chrono::Utc::now().timestamp())?;
        Ok(payload)
    }
}

/// Policy checks on an already decoded payload, in a fixed order:
/// audience, expiry, repository.
pub fn check_claims(
    policy: &AccessPolicy,
    payload: &ClaimsPayload,
    now: i64,
) -> Result<(), AuthError> {
    if let Some(expected) = policy.expected_audience()
        && payload.audience != expected
    {
        return Err(AuthError::AudienceMismatch);
    }

    if payload.expires_at <= now {
        return Err(AuthError::TokenExpired);
    }

    if !policy.repository_allowed(&payload.repository) {
        return Err(AuthError::RepositoryNotAllowed(payload.repository.clone()));
    }

    Ok(())
}

#[async_trait]
impl CredentialVerifier for ClaimsVerifier {
    fn name(&self) -> &'static str {
        "claims"
    }

    #[instrument(skip_all, fields(fingerprint = %credential.fingerprint()))]
    async fn verify(&self, credential: &Credential) -> Result<Grant, AuthError> {
        let payload = self.verify_token(credential.value()).await?;

        info!(
            actor = %payload.actor,
            repository = %payload.repository,
            workflow = %payload.workflow_name,
            "claims token accepted"
        );

        // actor, not sub: sub names the workflow ref, not a person
        Ok(Grant::new(payload.actor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn payload(audience: &str, repository: &str, expires_at: i64) -> ClaimsPayload {
        ClaimsPayload {
            subject: format!("repo:{repository}:ref:refs/heads/main"),
            audience: audience.into(),
            repository: repository.into(),
            actor: "github-actions".into(),
            workflow_name: "CI".into(),
            r#ref: "refs/heads/main".into(),
            issued_at: NOW - 60,
            expires_at,
        }
    }

    fn policy() -> AccessPolicy {
        AccessPolicy::new("test-realm")
            .unwrap()
            .with_claims(true, Some("https://example.com".into()))
            .with_allowed_repos(["owner/repo"])
    }

    #[test]
    fn accepts_matching_unexpired_claims() {
        let claims = payload("https://example.com", "owner/repo", NOW + 3600);
        assert_eq!(check_claims(&policy(), &claims, NOW), Ok(()));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let claims = payload("https://example.com", "owner/repo", NOW);
        assert_eq!(
            check_claims(&policy(), &claims, NOW),
            Err(AuthError::TokenExpired)
        );
    }

    #[test]
    fn audience_is_checked_before_expiry() {
        let claims = payload("https://other.example", "owner/repo", NOW - 10);
        assert_eq!(
            check_claims(&policy(), &claims, NOW),
            Err(AuthError::AudienceMismatch)
        );
    }

    #[test]
    fn repository_allow_list_applies_only_when_set() {
        let claims = payload("https://example.com", "owner/other", NOW + 60);
        assert_eq!(
            check_claims(&policy(), &claims, NOW),
            Err(AuthError::RepositoryNotAllowed("owner/other".into()))
        );

        let open = AccessPolicy::new("test-realm")
            .unwrap()
            .with_claims(true, None);
        assert_eq!(check_claims(&open, &claims, NOW), Ok(()));
    }
}
