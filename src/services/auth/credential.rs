//! `Authorization` header parsing.
use std::fmt;

use base64::Engine as _;
use sha2::{Digest, Sha256};

use super::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Bearer,
    Token,
}

impl Scheme {
    fn prefix(self) -> &'static str {
        match self {
            Self::Bearer => "Bearer ",
            Self::Token => "token ",
        }
    }
}

/// Caller-presented credential. Lives for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    scheme: Scheme,
    value: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl Credential {
    pub fn new(scheme: Scheme, value: impl Into<String>) -> Self {
        Self {
            scheme,
            value: value.into(),
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Short, non-reversible tag for log correlation.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.value.as_bytes());
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&digest[..6])
    }
}

/// Parse the raw `Authorization` header value.
///
/// Only `Bearer <token>` and `token <token>` are accepted (case-sensitive).
pub fn extract_credential(header: Option<&str>) -> Result<Credential, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    if header.is_empty() {
        return Err(AuthError::MissingCredential);
    }

    let (scheme, value) = [Scheme::Bearer, Scheme::Token]
        .into_iter()
        .find_map(|scheme| {
            header
                .strip_prefix(scheme.prefix())
                .map(|value| (scheme, value))
        })
        .ok_or(AuthError::MalformedCredential("unsupported authorization scheme"))?;

    if value.is_empty() {
        return Err(AuthError::MalformedCredential("empty token"));
    }

    Ok(Credential::new(scheme, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bearer_and_token_prefixes() {
        let bearer = extract_credential(Some("Bearer abc")).unwrap();
        assert_eq!(bearer.scheme(), Scheme::Bearer);
        assert_eq!(bearer.value(), "abc");

        let token = extract_credential(Some("token abc")).unwrap();
        assert_eq!(token.scheme(), Scheme::Token);
        assert_eq!(token.value(), "abc");
    }

    #[test]
    fn rejects_other_schemes_and_empty_values() {
        assert_eq!(
            extract_credential(None),
            Err(AuthError::MissingCredential)
        );
        assert_eq!(
            extract_credential(Some("")),
            Err(AuthError::MissingCredential)
        );
        assert!(matches!(
            extract_credential(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedCredential(_))
        ));
        assert!(matches!(
            extract_credential(Some("Bearer ")),
            Err(AuthError::MalformedCredential(_))
        ));
        // prefixes are case-sensitive
        assert!(extract_credential(Some("bearer abc")).is_err());
        assert!(extract_credential(Some("Token abc")).is_err());
    }

    #[test]
    fn debug_output_does_not_leak_the_token() {
        let credential = Credential::new(Scheme::Bearer, "super-secret-value");
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("super-secret-value"));
        assert!(rendered.contains("fingerprint"));
    }
}
