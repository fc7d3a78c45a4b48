/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the authorized principal (AuthCtx) to handlers
 * - axum-specific code stays in core, the type itself in types
 */

mod core;
mod types;

pub use core::AuthCtxExtractor;
pub use types::AuthCtx;
