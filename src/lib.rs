//! # Security Exception Filter
//!
//! Tower middleware that turns authentication and authorization failures into
//! structured JSON error responses.
//!
//! A protected service fails with a [`SecurityError`] (either as its service
//! error, as [`GuardLayer`] does, or by returning it from an axum handler).
//! The [`SecurityExceptionFilterLayer`] catches it and renders it with the
//! first handler, in ascending priority, whose URL patterns match the request.
//!
//! ## Features
//!
//! - **Per endpoint group**: a REST handler for `/**` and a GraphQL handler for
//!   `/graphql` out of the box, both configurable
//! - **Priority ordering**: lower priority values are consulted first
//! - **Ant-style patterns**: `*`, `?` and `**` path matching
//! - **Custom handlers**: build your own with [`HandlerBuilder`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, error_handling::HandleErrorLayer, routing::get};
//! use security_exception_filter::prelude::*;
//! use tower::ServiceBuilder;
//!
//! async fn me() -> Result<&'static str, SecurityError> {
//!     Err(SecurityError::unauthenticated("missing session"))
//! }
//!
//! # fn build() -> security_exception_filter::Result<Router> {
//! let properties = SecurityHandlerProperties::from_config(&ConfigService::new())?;
//! let filter = SecurityExceptionFilterLayer::from_properties(&properties)?;
//!
//! let app = Router::new().route("/me", get(me)).layer(
//!     ServiceBuilder::new()
//!         .layer(HandleErrorLayer::new(handle_unmatched))
//!         .layer(filter),
//! );
//! # Ok(app)
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exception;
pub mod filter;
pub mod guard;
pub mod handler;
pub mod matcher;

// Re-export core types
pub use config::{ConfigService, HandlerConfig, SecurityHandlerProperties};
pub use error::{Error, Result};
pub use exception::{ErrorInfo, ErrorResponse, ExceptionClassification, ResponseFormat};
pub use filter::{SecurityExceptionFilter, SecurityExceptionFilterLayer, handle_unmatched};
pub use guard::{Guard, GuardLayer, SecurityError};
pub use handler::{
    ConfigurableHandler, ExceptionHandler, HandlerBuilder, HandlerRegistry, RequestHead,
    UrlPredicate,
};
pub use matcher::{EmptyPatterns, UrlMatcher};

/// Prelude module for convenient imports
///
/// ```
/// use security_exception_filter::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigService, HandlerConfig, SecurityHandlerProperties};
    pub use crate::error::Error;
    pub use crate::exception::{
        ErrorResponse, ExceptionClassification, ResponseFormat, graphql_json_body_mapping,
        json_body_mapping,
    };
    pub use crate::filter::{BoxError, SecurityExceptionFilterLayer, handle_unmatched};
    pub use crate::guard::{Guard, GuardLayer, GuardResult, SecurityError};
    pub use crate::handler::{
        ConfigurableHandler, ExceptionHandler, HandlerBuilder, HandlerRegistry, RequestHead,
        RequestPredicate, UrlPredicate,
    };
    pub use crate::matcher::{EmptyPatterns, UrlMatcher};
    pub use async_trait::async_trait;
    pub use std::sync::Arc;
}
