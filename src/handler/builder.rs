use std::error::Error;
use std::fmt;

use super::{ExceptionHandler, RequestHead};
use crate::error::{Error as ConfigError, Result};
use crate::exception::ErrorResponse;
use crate::matcher::{EmptyPatterns, UrlMatcher};

type HandleFn = dyn Fn(&(dyn Error + Send + Sync + 'static)) -> ErrorResponse + Send + Sync;

/// Decides whether a handler is responsible for a request.
pub trait RequestPredicate: Send + Sync + 'static {
    fn test(&self, request: &RequestHead) -> bool;
}

impl<F> RequestPredicate for F
where
    F: Fn(&RequestHead) -> bool + Send + Sync + 'static,
{
    fn test(&self, request: &RequestHead) -> bool {
        self(request)
    }
}

/// Matches a request path against ant-style patterns.
///
/// With no patterns nothing matches.
#[derive(Debug, Clone)]
pub struct UrlPredicate {
    matcher: UrlMatcher,
}

impl UrlPredicate {
    pub fn new<I, P>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        Ok(Self {
            matcher: UrlMatcher::new(patterns, EmptyPatterns::MatchNone)?,
        })
    }
}

impl RequestPredicate for UrlPredicate {
    fn test(&self, request: &RequestHead) -> bool {
        self.matcher.matches(request.path())
    }
}

/// Assembles an [`FnHandler`] from a predicate and a mapping function.
///
/// # Example
/// ```
/// use security_exception_filter::exception::json_body_mapping;
/// use security_exception_filter::handler::{HandlerBuilder, UrlPredicate};
///
/// let handler = HandlerBuilder::new()
///     .can_handle(UrlPredicate::new(["/api/**"]).unwrap())
///     .handle(json_body_mapping())
///     .order(10)
///     .build()
///     .unwrap();
/// ```
#[derive(Default)]
pub struct HandlerBuilder {
    name: Option<String>,
    predicate: Option<Box<dyn RequestPredicate>>,
    handle: Option<Box<HandleFn>>,
    order: i32,
}

impl HandlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn can_handle(mut self, predicate: impl RequestPredicate) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn handle<F>(mut self, handle: F) -> Self
    where
        F: Fn(&(dyn Error + Send + Sync + 'static)) -> ErrorResponse + Send + Sync + 'static,
    {
        self.handle = Some(Box::new(handle));
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn build(self) -> Result<FnHandler> {
        let predicate = self
            .predicate
            .ok_or(ConfigError::IncompleteHandler("request predicate"))?;
        let handle = self
            .handle
            .ok_or(ConfigError::IncompleteHandler("handle function"))?;

        Ok(FnHandler {
            name: self.name.unwrap_or_else(|| "handler".to_owned()),
            predicate,
            handle,
            order: self.order,
        })
    }
}

/// A handler built from closures by [`HandlerBuilder`].
pub struct FnHandler {
    name: String,
    predicate: Box<dyn RequestPredicate>,
    handle: Box<HandleFn>,
    order: i32,
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl ExceptionHandler for FnHandler {
    fn can_handle(&self, request: &RequestHead) -> bool {
        self.predicate.test(request)
    }

    fn handle(&self, error: &(dyn Error + Send + Sync + 'static)) -> ErrorResponse {
        (self.handle)(error)
    }

    fn priority(&self) -> i32 {
        self.order
    }

    fn name(&self) -> &str {
        &self.name
    }
}
