/*
 * Responsibility
 * - The authorized-request context handlers see
 * - Filled in by the access middleware from the backend's Grant
 *
 * Notes
 * - Token verification lives in services/auth; this is only the contract.
 */

/// Context attached to every authorized request.
///
/// `principal` is the acting identity (GitHub login or workflow actor);
/// repository-scope checks downstream are keyed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub principal: String,
}

impl AuthCtx {
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
        }
    }
}
