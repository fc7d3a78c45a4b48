/*
 * Responsibility
 * - Per-request authentication failure taxonomy
 * - Kept free of HTTP types; the axum adapter decides how a failure is rendered
 */
use thiserror::Error;

/// Why a credential was not accepted.
///
/// Every variant is converted into a [`Challenge`](super::Challenge) at the
/// engine boundary, so callers only ever see "authentication required".
/// The variant itself is for logs and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,

    #[error("malformed credential: {0}")]
    MalformedCredential(&'static str),

    #[error("claims token signature rejected")]
    SignatureInvalid,

    #[error("claims token audience mismatch")]
    AudienceMismatch,

    #[error("claims token expired")]
    TokenExpired,

    #[error("repository {0} is not allowed")]
    RepositoryNotAllowed(String),

    #[error("{0} is not a member of any allowed organization")]
    OrgMembershipDenied(String),

    // Upstream detail is logged where it happens and intentionally dropped here.
    #[error("remote identity verification failed")]
    RemoteVerificationFailure,
}
