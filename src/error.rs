/*
 * Responsibility
 * - Application-wide AppError definition
 * - IntoResponse (HTTP status / JSON error body)
 * - Authorization challenges render as 401 + WWW-Authenticate, whatever their cause
 */
use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::middleware::auth::challenge::www_authenticate;
use crate::services::auth::Challenge;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Unauthorized(#[from] Challenge),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, challenge) = match self {
            // Display of a Challenge is "authentication required" + realm, nothing more
            AppError::Unauthorized(challenge) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                challenge.to_string(),
                www_authenticate(&challenge),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        let mut response = (status, Json(body)).into_response();
        response
            .headers_mut()
            .insert(header::WWW_AUTHENTICATE, challenge);
        response
    }
}
