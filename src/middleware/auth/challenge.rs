//! Challenge → `WWW-Authenticate` rendering (HTTP boundary only).
use axum::http::HeaderValue;

use crate::services::auth::Challenge;

/// `Bearer realm="<realm>",service="registry"`.
///
/// Non-ASCII realms go out as raw UTF-8 (obs-text). Falls back to a
/// realm-less challenge only for control characters.
pub fn www_authenticate(challenge: &Challenge) -> HeaderValue {
    let value = format!(
        "Bearer realm={},service={}",
        quote(challenge.realm()),
        quote(challenge.service())
    );

    HeaderValue::from_bytes(value.as_bytes()).unwrap_or_else(|_| {
        tracing::warn!("realm not representable in WWW-Authenticate; omitting it");
        HeaderValue::from_static("Bearer service=\"registry\"")
    })
}

fn quote(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
