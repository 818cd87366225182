use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::debug;

use crate::app::errors::json_error;
use crate::context::session_from_headers;

/// Rejects requests without a usable session; otherwise stores the
/// `SessionContext` as a request extension for the handlers.
pub async fn session_middleware(mut req: Request, next: Next) -> Response {
    match session_from_headers(req.headers()) {
        Ok(session) => {
            req.extensions_mut().insert(session);
            next.run(req).await
        }
        Err(message) => {
            debug!(path = %req.uri().path(), %message, "rejected request without session");
            json_error(StatusCode::UNAUTHORIZED, "unauthenticated", message)
        }
    }
}
