//! Security exception handlers and the registry that orders them.
//!
//! A handler decides from the request head whether it is responsible for a
//! failed request, and renders the error into an [`ErrorResponse`].

use axum::http::{Method, Request, Uri};
use std::error::Error;

use crate::error::Result;
use crate::exception::{ErrorResponse, ExceptionClassification, ResponseFormat};
use crate::matcher::{EmptyPatterns, UrlMatcher};

mod builder;
mod registry;

pub use builder::{FnHandler, HandlerBuilder, RequestPredicate, UrlPredicate};
pub use registry::HandlerRegistry;

/// The parts of a request captured before it is handed to the inner service.
#[derive(Debug, Clone)]
pub struct RequestHead {
    pub method: Method,
    pub uri: Uri,
}

impl RequestHead {
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

/// The ExceptionHandler trait
///
/// Handlers are consulted in ascending [`priority`](ExceptionHandler::priority)
/// order; the first one whose `can_handle` returns true renders the response.
pub trait ExceptionHandler: Send + Sync + 'static {
    fn can_handle(&self, request: &RequestHead) -> bool;

    fn handle(&self, error: &(dyn Error + Send + Sync + 'static)) -> ErrorResponse;

    /// Lower runs earlier.
    fn priority(&self) -> i32 {
        0
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A handler defined by URL patterns, a priority and a response format.
///
/// An empty pattern list matches every request.
#[derive(Debug, Clone)]
pub struct ConfigurableHandler {
    name: String,
    matcher: UrlMatcher,
    priority: i32,
    format: ResponseFormat,
}

impl ConfigurableHandler {
    pub fn new<I, P>(
        name: impl Into<String>,
        urls: I,
        priority: i32,
        format: ResponseFormat,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        Ok(Self {
            name: name.into(),
            matcher: UrlMatcher::new(urls, EmptyPatterns::MatchAll)?,
            priority,
            format,
        })
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.matcher.patterns()
    }
}

impl ExceptionHandler for ConfigurableHandler {
    fn can_handle(&self, request: &RequestHead) -> bool {
        self.matcher.matches(request.path())
    }

    fn handle(&self, error: &(dyn Error + Send + Sync + 'static)) -> ErrorResponse {
        self.format.render(ExceptionClassification::of(error))
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::SecurityError;
    use axum::http::StatusCode;

    fn head(path: &str) -> RequestHead {
        RequestHead {
            method: Method::GET,
            uri: path.parse().unwrap(),
        }
    }

    #[test]
    fn test_configurable_handler_without_urls_matches_everything() {
        let handler =
            ConfigurableHandler::new("catch-all", Vec::<String>::new(), 5, ResponseFormat::Rest)
                .unwrap();
        assert!(handler.can_handle(&head("/anything/at/all")));
        assert_eq!(handler.priority(), 5);
        assert_eq!(handler.name(), "catch-all");
    }

    #[test]
    fn test_configurable_handler_matches_urls() {
        let handler =
            ConfigurableHandler::new("graphql", ["/graphql"], 0, ResponseFormat::Graphql).unwrap();
        assert!(handler.can_handle(&head("/graphql?query=x")));
        assert!(!handler.can_handle(&head("/api/users")));
    }

    #[test]
    fn test_configurable_handler_renders_its_format() {
        let handler = ConfigurableHandler::new("default", ["/**"], 100, ResponseFormat::Rest)
            .unwrap();
        let response = handler.handle(&SecurityError::forbidden("no"));
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert_eq!(
            response.body,
            r#"{"code":"ACCESS_DENIED","message":"Access denied"}"#
        );
    }
}
