//! The security exception filter middleware.
//!
//! The filter wraps a service and converts authentication/authorization
//! failures coming out of it into JSON responses, using the first matching
//! handler of a [`HandlerRegistry`](crate::handler::HandlerRegistry). A
//! failure is either a boxed [`SecurityError`] returned as the service error
//! or a response produced by `SecurityError::into_response`.
//!
//! Unmatched security errors are returned unchanged. Since axum routers
//! require infallible services, put [`handle_unmatched`] behind
//! `axum::error_handling::HandleErrorLayer` on top of the filter.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::guard::SecurityError;

mod layer;

pub use layer::{SecurityExceptionFilter, SecurityExceptionFilterLayer};

/// Type-erased error flowing through the middleware stack
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fallback for errors no handler claimed.
///
/// Security errors become their bare 401/403 status, everything else a 500.
pub async fn handle_unmatched(error: BoxError) -> Response {
    match error.downcast::<SecurityError>() {
        Ok(security_error) => security_error.into_response(),
        Err(error) => {
            tracing::error!(error = %error, "unhandled error in request pipeline");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
