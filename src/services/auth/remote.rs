/*
 * Responsibility
 * - Opaque token (PAT) verification by asking the identity API who the token belongs to
 * - Optional organization membership gate
 *
 * Notes
 * - No retries. One transport failure ends the attempt (or, for membership, that org).
 * - Cancellation: dropping the `verify` future drops the in-flight reqwest call.
 */
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{ACCEPT, AUTHORIZATION},
    redirect::Policy,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ConfigError;
use crate::services::auth::{AccessPolicy, AuthError, Credential, CredentialVerifier, Grant};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Profile returned by `GET {base}/user`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityRecord {
    #[serde(rename = "login")]
    pub principal_name: String,
    #[serde(rename = "id")]
    pub external_id: i64,
    #[serde(rename = "type")]
    pub account_type: String,
}

/// Outcome of one organization membership lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Confirmed,
    NotConfirmed(StatusCode),
    Unreachable,
}

/// Shared outbound client: bounded per-call timeout, identifying user agent.
pub fn build_http_client(policy: &AccessPolicy) -> Result<Client, ConfigError> {
    let timeout = policy.request_timeout();
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(timeout.min(Duration::from_secs(3)))
        .timeout(timeout)
        .redirect(Policy::limited(3))
        .build()
        .map_err(|_| ConfigError::Invalid("http_client"))
}

#[derive(Debug, Clone)]
pub struct RemoteIdentityVerifier {
    policy: Arc<AccessPolicy>,
    client: Client,
}

impl RemoteIdentityVerifier {
    pub fn new(policy: Arc<AccessPolicy>, client: Client) -> Self {
        Self { policy, client }
    }

    pub async fn fetch_identity(&self, token: &str) -> Result<IdentityRecord, AuthError> {
        let url = self.endpoint(["user"])?;

        let response = self.get(url, token).send().await.map_err(|e| {
            warn!(error = %e, timeout = e.is_timeout(), "identity api call failed");
            AuthError::RemoteVerificationFailure
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "identity api rejected token");
            return Err(AuthError::RemoteVerificationFailure);
        }

        response.json::<IdentityRecord>().await.map_err(|e| {
            warn!(error = %e, "identity api returned an unreadable profile");
            AuthError::RemoteVerificationFailure
        })
    }

    /// Only `204 No Content` confirms membership.
    pub async fn membership(&self, token: &str, org: &str, login: &str) -> Membership {
        let url = match self.endpoint(["orgs", org, "members", login]) {
            Ok(url) => url,
            Err(_) => return Membership::Unreachable,
        };

        match self.get(url, token).send().await {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => Membership::Confirmed,
            Ok(response) => Membership::NotConfirmed(response.status()),
            Err(e) => {
                warn!(org, error = %e, "organization membership lookup failed");
                Membership::Unreachable
            }
        }
    }

    /// First allowed organization that confirms membership, in configured order.
    pub async fn confirm_membership(&self, token: &str, login: &str) -> Option<String> {
        for org in self.policy.allowed_orgs() {
            match self.membership(token, org, login).await {
                Membership::Confirmed => return Some(org.clone()),
                Membership::NotConfirmed(status) => {
                    debug!(org, login, status = status.as_u16(), "membership not confirmed");
                }
                Membership::Unreachable => {
                    debug!(org, login, "membership unknown, organization skipped");
                }
            }
        }
        None
    }

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, AuthError> {
        let mut url = self.policy.api_base().clone();
        url.path_segments_mut()
            .map_err(|_| AuthError::RemoteVerificationFailure)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url, token: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header(AUTHORIZATION, format!("token {token}"))
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
    }
}

#[async_trait]
impl CredentialVerifier for RemoteIdentityVerifier {
    fn name(&self) -> &'static str {
        "remote"
    }

    #[instrument(skip_all, fields(fingerprint = %credential.fingerprint()))]
    async fn verify(&self, credential: &Credential) -> Result<Grant, AuthError> {
        let token = credential.value();
        let identity = self.fetch_identity(token).await?;

        if !self.policy.allowed_orgs().is_empty() {
            match self.confirm_membership(token, &identity.principal_name).await {
                Some(org) => debug!(login = %identity.principal_name, org, "membership confirmed"),
                None => {
                    warn!(
                        login = %identity.principal_name,
                        "user is not a member of any allowed organization"
                    );
                    return Err(AuthError::OrgMembershipDenied(identity.principal_name));
                }
            }
        }

        info!(
            login = %identity.principal_name,
            id = identity.external_id,
            account_type = %identity.account_type,
            "identity api accepted token"
        );

        Ok(Grant::new(identity.principal_name))
    }
}
