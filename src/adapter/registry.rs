//! Adapter registry
//!
//! A keyed map passed in at session configuration time. It is itself an
//! adapter: each fetch is routed to the adapter registered for the
//! request's source id.

use super::{FetchRequest, SourceAdapter};
use crate::error::{Error, Result};
use crate::source::SourcePage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Source id to adapter map
pub struct AdapterRegistry<T> {
    adapters: HashMap<String, Arc<dyn SourceAdapter<T>>>,
    order: Vec<String>,
}

impl<T: Send + 'static> AdapterRegistry<T> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register an adapter, replacing any previous one for the same id
    pub fn register(&mut self, source_id: impl Into<String>, adapter: Arc<dyn SourceAdapter<T>>) {
        let source_id = source_id.into();
        if self.adapters.insert(source_id.clone(), adapter).is_none() {
            self.order.push(source_id);
        }
    }

    /// Builder-style [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, source_id: impl Into<String>, adapter: Arc<dyn SourceAdapter<T>>) -> Self {
        self.register(source_id, adapter);
        self
    }

    /// Adapter for a source
    pub fn get(&self, source_id: &str) -> Option<&Arc<dyn SourceAdapter<T>>> {
        self.adapters.get(source_id)
    }

    /// Whether a source is registered
    pub fn contains(&self, source_id: &str) -> bool {
        self.adapters.contains_key(source_id)
    }

    /// Registered ids in registration order
    pub fn source_ids(&self) -> &[String] {
        &self.order
    }

    /// Number of registered adapters
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl<T: Send + 'static> Default for AdapterRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + 'static> SourceAdapter<T> for AdapterRegistry<T> {
    async fn fetch_page(&self, request: FetchRequest) -> Result<SourcePage<T>> {
        let adapter = self
            .adapters
            .get(&request.source_id)
            .ok_or_else(|| Error::unknown_source(request.source_id.clone()))?;
        adapter.fetch_page(request).await
    }
}

impl<T> std::fmt::Debug for AdapterRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("sources", &self.order)
            .finish()
    }
}
