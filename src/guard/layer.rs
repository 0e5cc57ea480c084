use crate::guard::Guard;
use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower Layer for Guards
///
/// Guards run in order before the inner service. The first rejection is
/// raised as a boxed [`SecurityError`](crate::guard::SecurityError).
#[derive(Clone)]
pub struct GuardLayer {
    guards: Arc<Vec<Box<dyn Guard>>>,
}

impl GuardLayer {
    pub fn new(guards: Vec<Box<dyn Guard>>) -> Self {
        Self {
            guards: Arc::new(guards),
        }
    }
}

impl<S> Layer<S> for GuardLayer {
    type Service = GuardMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        GuardMiddleware {
            inner,
            guards: self.guards.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GuardMiddleware<S> {
    inner: S,
    guards: Arc<Vec<Box<dyn Guard>>>,
}

impl<S> Service<Request<Body>> for GuardMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
{
    type Response = Response;
    type Error = Box<dyn std::error::Error + Send + Sync>;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let guards = self.guards.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            // Body is not Sync, so guards only see the head
            let (parts, body) = req.into_parts();
            for guard in guards.iter() {
                if let Err(e) = guard.can_activate(&parts).await {
                    tracing::debug!(uri = %parts.uri, error = %e, "guard rejected request");
                    return Err(Box::new(e) as Box<dyn std::error::Error + Send + Sync>);
                }
            }
            inner
                .call(Request::from_parts(parts, body))
                .await
                .map_err(Into::into)
        })
    }
}
