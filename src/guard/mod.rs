use async_trait::async_trait;
use axum::{
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::exception::ExceptionClassification;

mod layer;

pub use layer::{GuardLayer, GuardMiddleware};

/// Standard Result type for Guard
/// Ok(()) means allowed
/// Err(SecurityError) means denied
pub type GuardResult = Result<(), SecurityError>;

/// Authentication and authorization failures raised while a request is processed.
///
/// These are the errors the exception filter intercepts. Any other error type
/// travelling through the middleware stack is left alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecurityError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl SecurityError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn classification(&self) -> ExceptionClassification {
        match self {
            SecurityError::Unauthenticated(_) => ExceptionClassification::Unauthenticated,
            SecurityError::Forbidden(_) => ExceptionClassification::Forbidden,
        }
    }
}

/// Lets axum handlers fail with `Err(SecurityError)`.
///
/// The bare 401/403 response keeps the error in its extensions so that an
/// enclosing exception filter can rewrite it into a JSON body.
impl IntoResponse for SecurityError {
    fn into_response(self) -> Response {
        let status = match &self {
            SecurityError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            SecurityError::Forbidden(_) => StatusCode::FORBIDDEN,
        };
        let mut response = status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// The Guard trait
/// Implement this to protect routes
#[async_trait]
pub trait Guard: Send + Sync + 'static {
    async fn can_activate(&self, request: &Parts) -> GuardResult;
}
