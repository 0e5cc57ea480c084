//! Error classification and the canonical error descriptions rendered by handlers.

use axum::http::StatusCode;
use std::error::Error;
use strum_macros::{AsRefStr, Display};

use crate::guard::SecurityError;

pub mod mapper;

pub use mapper::{ErrorResponse, ResponseFormat, graphql_json_body_mapping, json_body_mapping};

/// Classification of a caught error, derived from its runtime type.
///
/// The string form is the GraphQL `classification` extension value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionClassification {
    Unauthenticated,
    Forbidden,
    #[strum(serialize = "INTERNAL_ERROR")]
    Other,
}

impl ExceptionClassification {
    /// Classify an error by downcasting it to [`SecurityError`].
    pub fn of(error: &(dyn Error + 'static)) -> Self {
        match error.downcast_ref::<SecurityError>() {
            Some(security_error) => security_error.classification(),
            None => Self::Other,
        }
    }

    /// Whether the exception filter intercepts errors of this class.
    pub fn is_security(self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Forbidden)
    }
}

/// Flattened description of an error, enough to render either response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorInfo {
    pub http_status: StatusCode,
    pub message: &'static str,
    pub code: &'static str,
    pub error_type: &'static str,
    pub classification: ExceptionClassification,
}

impl From<ExceptionClassification> for ErrorInfo {
    fn from(classification: ExceptionClassification) -> Self {
        match classification {
            ExceptionClassification::Unauthenticated => ErrorInfo {
                http_status: StatusCode::UNAUTHORIZED,
                message: "Authentication required",
                code: "AUTHENTICATION_ERROR",
                error_type: "AUTHENTICATION_REQUIRED",
                classification,
            },
            ExceptionClassification::Forbidden => ErrorInfo {
                http_status: StatusCode::FORBIDDEN,
                message: "Access denied",
                code: "ACCESS_DENIED",
                error_type: "ACCESS_DENIED",
                classification,
            },
            ExceptionClassification::Other => ErrorInfo {
                http_status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Internal server error",
                code: "INTERNAL_ERROR",
                error_type: "INTERNAL_SERVER_ERROR",
                classification,
            },
        }
    }
}
