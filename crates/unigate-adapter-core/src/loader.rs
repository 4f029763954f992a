use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::adapter::ChatAdapter;
use crate::errors::AdapterResult;
use crate::registry::ModelRegistry;

type BuildFn = Box<dyn Fn() -> AdapterResult<Arc<dyn ChatAdapter>> + Send + Sync>;

/// Startup-time registration of one backend: an explicit declared identifier
/// plus a constructor. Collected into the loader's table instead of scanning
/// the filesystem, so backends stay addable without touching the gateway.
pub struct AdapterFactory {
    name: &'static str,
    build: BuildFn,
}

impl AdapterFactory {
    pub fn new<F>(name: &'static str, build: F) -> Self
    where
        F: Fn() -> AdapterResult<Arc<dyn ChatAdapter>> + Send + Sync + 'static,
    {
        Self {
            name,
            build: Box::new(build),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Every successfully constructed adapter plus the registry derived from
/// their declared models. Owned for the process lifetime; adapters are never
/// removed or hot-reloaded.
pub struct LoadedAdapters {
    adapters: HashMap<String, Arc<dyn ChatAdapter>>,
    registry: ModelRegistry,
}

impl LoadedAdapters {
    /// Resolve a model name to its adapter instance: registry lookup first,
    /// then the instance map. `None` when either misses.
    pub fn get(&self, model: &str) -> Option<Arc<dyn ChatAdapter>> {
        let adapter = self.registry.resolve_adapter(model)?;
        self.adapters.get(adapter).cloned()
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Instantiate every declared adapter exactly once. A factory that fails to
/// build is logged and skipped; it never aborts loading of the rest. A
/// duplicate declared name is replaced; last registration wins.
pub fn load_all(factories: Vec<AdapterFactory>) -> LoadedAdapters {
    let mut adapters: HashMap<String, Arc<dyn ChatAdapter>> = HashMap::new();

    for factory in factories {
        let adapter = match (factory.build)() {
            Ok(adapter) => adapter,
            Err(err) => {
                warn!(adapter = factory.name, error = %err, "adapter failed to load, skipping");
                continue;
            }
        };
        if adapters.insert(factory.name.to_string(), adapter).is_some() {
            warn!(adapter = factory.name, "duplicate adapter name, last registration wins");
        } else {
            info!(adapter = factory.name, "adapter loaded");
        }
    }

    let mut registry = ModelRegistry::new();
    for (name, adapter) in &adapters {
        registry.register(name, adapter.supported_models());
    }

    LoadedAdapters { adapters, registry }
}
