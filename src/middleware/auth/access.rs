//! `Authorization` → configured backend → `AuthCtx` in request extensions.
//!
//! Rejections never reach the handler: the backend's `Challenge` is returned
//! as `AppError::Unauthorized` and rendered as 401 + `WWW-Authenticate`.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::middleware::http::REQUEST_ID_HEADER;
use crate::services::auth::RequestContext;
use crate::state::AppState;

/// Put the given routes behind the authorization backend.
///
/// ```ignore
/// let v2 = middleware::auth::access::apply(api::v2::routes(), state.clone());
/// let app = Router::new().merge(v2).with_state(state);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // from_fn cannot take a State extractor in axum 0.8; pass the state explicitly
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = RequestContext {
        request_id: req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    };

    // A header that is not visible ASCII is treated as absent.
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let grant = state.access.authorized(&ctx, authorization).await?;

    let auth_ctx = AuthCtx::new(grant.principal_name);

    // handed to handlers through AuthCtxExtractor
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
