use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::MessageResponse;
use crate::Error;

/// Implements conversion into json response for all possible error variants.
///
/// # Error message stripping in production
///
/// When compiled with optimizations ("release mode"), messages of server
/// errors are replaced with a generic one.
///
/// Backtrace and additional context information (e.g. user information) are
/// never part of the response and always only available through the
/// application logs.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!("{}", self);
            if cfg!(debug_assertions) {
                self.kind.to_string()
            } else {
                "internal server error".to_string()
            }
        } else {
            tracing::info!(status = status.as_u16(), "{}", self.kind);
            self.kind.to_string()
        };
        (status, Json(MessageResponse::new(message))).into_response()
    }
}
