pub mod keys;
pub mod payload;
pub mod verifier;

pub use keys::KeySetCache;
pub use payload::ClaimsPayload;
pub use verifier::{ClaimsVerifier, check_claims};
