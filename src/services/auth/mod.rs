pub mod challenge;
pub mod claims;
pub mod credential;
pub mod engine;
pub mod error;
pub mod factory;
pub mod policy;
pub mod registry;
pub mod remote;

pub use challenge::{CHALLENGE_SERVICE, Challenge, Grant};
pub use claims::{ClaimsPayload, ClaimsVerifier};
pub use credential::{Credential, Scheme, extract_credential};
pub use engine::{AccessController, AuthorizationEngine, CredentialVerifier, RequestContext};
pub use error::AuthError;
pub use factory::build_access_controller;
pub use policy::AccessPolicy;
pub use registry::{BackendRegistry, GITHUB_BACKEND, RegistryError};
pub use remote::{IdentityRecord, RemoteIdentityVerifier, build_http_client};
