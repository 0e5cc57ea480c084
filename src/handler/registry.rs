use std::fmt;
use std::sync::Arc;

use super::{ConfigurableHandler, ExceptionHandler, RequestHead};
use crate::config::SecurityHandlerProperties;
use crate::error::{Error, Result};

/// Immutable, priority-ordered list of handlers.
///
/// Cloning is cheap; every clone shares the same handlers.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: Arc<[Arc<dyn ExceptionHandler>]>,
}

impl HandlerRegistry {
    /// Sorts `handlers` by ascending priority. Handlers with equal priority keep
    /// the order they were given in.
    pub fn new(mut handlers: Vec<Arc<dyn ExceptionHandler>>) -> Result<Self> {
        if handlers.is_empty() {
            return Err(Error::NoEnabledHandlers);
        }
        handlers.sort_by_key(|handler| handler.priority());

        tracing::info!(
            handlers = ?handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            "security exception handlers registered"
        );

        Ok(Self {
            handlers: handlers.into(),
        })
    }

    /// One [`ConfigurableHandler`] per enabled entry.
    pub fn from_properties(properties: &SecurityHandlerProperties) -> Result<Self> {
        let mut handlers: Vec<Arc<dyn ExceptionHandler>> = Vec::new();

        for (name, config) in properties.handlers() {
            if !config.enabled {
                tracing::debug!(handler = name, "security exception handler disabled");
                continue;
            }
            let handler = ConfigurableHandler::new(
                name,
                &config.urls,
                config.order,
                config.response_format(name),
            )?;
            handlers.push(Arc::new(handler));
        }

        Self::new(handlers)
    }

    /// The first handler, in priority order, that accepts the request.
    pub fn find(&self, request: &RequestHead) -> Option<&Arc<dyn ExceptionHandler>> {
        self.handlers
            .iter()
            .find(|handler| handler.can_handle(request))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ExceptionHandler>> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| (h.name(), h.priority())))
            .finish()
    }
}
