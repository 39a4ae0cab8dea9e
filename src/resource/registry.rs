//! Handler Registry
//!
//! Holds one handler per resource kind and provides lookup functions for
//! the reconciliation driver and the CLI.

use super::handler::{ClientProvider, Handler};
use super::library_panel::LibraryPanelHandler;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct Registry {
    handlers: HashMap<String, Arc<dyn Handler>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in handler, sharing one provider
    pub fn with_defaults(provider: Arc<dyn ClientProvider>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(LibraryPanelHandler::new(provider)));
        registry
    }

    /// Register a handler, replacing any previous handler for its kind
    pub fn register(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.insert(handler.kind().to_string(), handler);
    }

    /// Get the handler for a kind
    pub fn handler(&self, kind: &str) -> Result<Arc<dyn Handler>> {
        self.handlers
            .get(kind)
            .cloned()
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))
    }

    /// All registered kinds, sorted
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        kinds.sort_unstable();
        kinds
    }

    /// All handlers, in kind order
    pub fn handlers(&self) -> Vec<Arc<dyn Handler>> {
        self.kinds()
            .into_iter()
            .filter_map(|kind| self.handlers.get(kind).cloned())
            .collect()
    }
}
