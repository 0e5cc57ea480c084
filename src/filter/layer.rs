use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use super::BoxError;
use crate::config::SecurityHandlerProperties;
use crate::error::Result;
use crate::exception::ExceptionClassification;
use crate::guard::SecurityError;
use crate::handler::{HandlerRegistry, RequestHead};

/// Tower Layer installing the security exception filter
#[derive(Debug, Clone)]
pub struct SecurityExceptionFilterLayer {
    registry: HandlerRegistry,
}

impl SecurityExceptionFilterLayer {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn from_properties(properties: &SecurityHandlerProperties) -> Result<Self> {
        HandlerRegistry::from_properties(properties).map(Self::new)
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }
}

impl<S> Layer<S> for SecurityExceptionFilterLayer {
    type Service = SecurityExceptionFilter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityExceptionFilter {
            inner,
            registry: self.registry.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SecurityExceptionFilter<S> {
    inner: S,
    registry: HandlerRegistry,
}

impl<S> Service<Request<Body>> for SecurityExceptionFilter<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send,
{
    type Response = Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let registry = self.registry.clone();
        let head = RequestHead::from_request(&request);

        // Call the service that was driven to readiness, leave the fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match inner.call(request).await {
                Ok(response) => Ok(rewrite_response(&registry, &head, response)),
                Err(error) => dispatch(&registry, &head, error.into()),
            }
        })
    }
}

/// Render a raised error with the first matching handler, or hand it back.
fn dispatch(
    registry: &HandlerRegistry,
    head: &RequestHead,
    error: BoxError,
) -> std::result::Result<Response, BoxError> {
    let classification = ExceptionClassification::of(&*error);
    if !classification.is_security() {
        return Err(error);
    }

    match registry.find(head) {
        Some(handler) => {
            tracing::debug!(
                handler = handler.name(),
                method = %head.method,
                path = head.path(),
                classification = %classification,
                "security exception handled"
            );
            Ok(handler.handle(&*error).into_response())
        }
        None => {
            tracing::warn!(
                method = %head.method,
                path = head.path(),
                error = %error,
                "no security exception handler matched, propagating error"
            );
            Err(error)
        }
    }
}

/// Responses built from a [`SecurityError`] are rewritten like raised errors.
fn rewrite_response(registry: &HandlerRegistry, head: &RequestHead, response: Response) -> Response {
    let Some(error) = response.extensions().get::<SecurityError>() else {
        return response;
    };

    let handled = registry.find(head).map(|handler| {
        tracing::debug!(
            handler = handler.name(),
            method = %head.method,
            path = head.path(),
            classification = %error.classification(),
            "security error response rewritten"
        );
        handler.handle(error)
    });

    match handled {
        Some(error_response) => error_response.into_response(),
        None => response,
    }
}
