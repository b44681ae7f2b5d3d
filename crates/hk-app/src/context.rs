//! Explicit application context shared by every service call.

use std::sync::Arc;

use hk_components::ComponentRegistry;
use hk_dispatch::Dispatcher;
use hk_results::RunStore;

/// Registry, supervisory layer and optional run store for one process.
///
/// Built once at startup and passed by reference; nothing in the service
/// layer reaches for global state.
#[derive(Debug)]
pub struct AppContext {
    registry: ComponentRegistry,
    dispatcher: Arc<Dispatcher>,
    store: Option<RunStore>,
}

impl AppContext {
    pub fn new() -> Self {
        Self {
            registry: ComponentRegistry::with_builtins(),
            dispatcher: Arc::new(Dispatcher::default()),
            store: None,
        }
    }

    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<Dispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_store(mut self, store: RunStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn store(&self) -> Option<&RunStore> {
        self.store.as_ref()
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}
