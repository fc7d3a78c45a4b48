use base64::{
    Engine as _,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose},
};
use serde::{Deserialize, Serialize};

use crate::services::auth::AuthError;

// base64url is translated to the standard alphabet before decoding, and
// padding is optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Claims carried in the middle segment of a workflow identity token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsPayload {
    #[serde(rename = "sub")]
    pub subject: String,
    #[serde(rename = "aud")]
    pub audience: String,
    pub repository: String,
    pub actor: String,
    #[serde(rename = "workflow", default)]
    pub workflow_name: String,
    #[serde(default)]
    pub r#ref: String,
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
}

impl ClaimsPayload {
    /// Decode the payload segment of a `header.payload.signature` token.
    ///
    /// No signature is checked here.
    pub fn from_token(token: &str) -> Result<Self, AuthError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [_, payload, _] = segments.as_slice() else {
            return Err(AuthError::MalformedCredential(
                "claims token must have three segments",
            ));
        };
        Self::from_segment(payload)
    }

    pub fn from_segment(segment: &str) -> Result<Self, AuthError> {
        let bytes = decode_segment(segment)
            .map_err(|_| AuthError::MalformedCredential("claims payload is not base64url"))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AuthError::MalformedCredential("claims payload is not valid json"))
    }

    /// Wire form of the payload segment (base64url, unpadded JSON).
    pub fn to_segment(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(json))
    }
}

pub fn decode_segment(segment: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let standard: String = segment
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    PAYLOAD_ENGINE.decode(standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ClaimsPayload {
        ClaimsPayload {
            subject: "repo:owner/repo:ref:refs/heads/main".into(),
            audience: "https://example.com".into(),
            repository: "owner/repo".into(),
            actor: "testuser".into(),
            workflow_name: "CI".into(),
            r#ref: "refs/heads/main".into(),
            issued_at: 1_700_000_000,
            expires_at: 1_700_003_600,
        }
    }

    #[test]
    fn segment_round_trip_preserves_every_field() {
        let payload = sample();
        let segment = payload.to_segment().unwrap();
        assert!(!segment.contains('='));

        let decoded = ClaimsPayload::from_segment(&segment).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn decodes_padded_and_unpadded_url_safe_input() {
        let unpadded = general_purpose::URL_SAFE_NO_PAD.encode("hello world");
        let padded = general_purpose::URL_SAFE.encode("hello world");

        assert_eq!(decode_segment(&unpadded).unwrap(), b"hello world");
        assert_eq!(decode_segment(&padded).unwrap(), b"hello world");
        // bytes that land on '-' / '_' in the url-safe alphabet
        let tricky = general_purpose::URL_SAFE_NO_PAD.encode([0xfb, 0xff, 0xfe]);
        assert_eq!(tricky, "-__-");
        assert_eq!(decode_segment(&tricky).unwrap(), [0xfb, 0xff, 0xfe]);
    }

    #[test]
    fn workflow_and_ref_are_optional() {
        let json = r#"{"sub":"s","aud":"a","repository":"o/r","actor":"bot","exp":2,"iat":1}"#;
        let segment = general_purpose::URL_SAFE_NO_PAD.encode(json);

        let decoded = ClaimsPayload::from_segment(&segment).unwrap();
        assert_eq!(decoded.workflow_name, "");
        assert_eq!(decoded.r#ref, "");
        assert_eq!(decoded.actor, "bot");
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!(
            ClaimsPayload::from_token("invalid.token"),
            Err(AuthError::MalformedCredential(_))
        ));
        assert!(matches!(
            ClaimsPayload::from_token("a.b.c.d"),
            Err(AuthError::MalformedCredential(_))
        ));
        assert!(matches!(
            ClaimsPayload::from_token("header.!!invalid!!.signature"),
            Err(AuthError::MalformedCredential(_))
        ));
        // decodes fine but misses required claims
        let partial = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"sub":"s"}"#);
        assert!(matches!(
            ClaimsPayload::from_token(&format!("h.{partial}.s")),
            Err(AuthError::MalformedCredential(_))
        ));
    }
}
