use std::collections::HashMap;

use tracing::warn;

use unigate_protocol::{Model, ModelObjectType};

/// Static mapping between model names and adapter names, built once at load
/// time and read-only afterwards. Concurrent reads need no synchronization.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    model_to_adapter: HashMap<String, String>,
    adapter_models: HashMap<String, Vec<String>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `models` for `adapter`. A model already claimed by another
    /// adapter is remapped (last registration wins) and dropped from the
    /// previous owner's listing.
    pub fn register(&mut self, adapter: &str, models: &[String]) {
        for model in models {
            if let Some(prev) = self
                .model_to_adapter
                .insert(model.clone(), adapter.to_string())
                && prev != adapter
            {
                warn!(model = %model, from = %prev, to = %adapter, "model remapped");
                if let Some(list) = self.adapter_models.get_mut(&prev) {
                    list.retain(|m| m != model);
                }
            }
        }
        let list = self.adapter_models.entry(adapter.to_string()).or_default();
        for model in models {
            if !list.contains(model) {
                list.push(model.clone());
            }
        }
    }

    pub fn resolve_adapter(&self, model: &str) -> Option<&str> {
        self.model_to_adapter.get(model).map(String::as_str)
    }

    pub fn models_for(&self, adapter: &str) -> Option<&[String]> {
        self.adapter_models.get(adapter).map(Vec::as_slice)
    }

    /// All registered models as OpenAI descriptors, sorted by id for stable
    /// listings.
    pub fn all_models(&self) -> Vec<Model> {
        let mut models: Vec<Model> = self
            .model_to_adapter
            .iter()
            .map(|(model, adapter)| Model {
                id: model.clone(),
                created: None,
                object: ModelObjectType::Model,
                owned_by: adapter.clone(),
            })
            .collect();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        models
    }

    pub fn len(&self) -> usize {
        self.model_to_adapter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.model_to_adapter.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn resolve_registered_model() {
        let mut registry = ModelRegistry::new();
        registry.register("echo", &names(&["echo-1"]));
        assert_eq!(registry.resolve_adapter("echo-1"), Some("echo"));
        assert_eq!(registry.resolve_adapter("ghost-model"), None);
    }

    #[test]
    fn remapped_model_leaves_previous_owner() {
        let mut registry = ModelRegistry::new();
        registry.register("first", &names(&["shared", "only-first"]));
        registry.register("second", &names(&["shared"]));

        assert_eq!(registry.resolve_adapter("shared"), Some("second"));
        assert_eq!(registry.models_for("first"), Some(names(&["only-first"]).as_slice()));

        let listed = registry.all_models();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|m| m.id != "shared" || m.owned_by == "second"));
    }

    #[test]
    fn all_models_sorted_by_id() {
        let mut registry = ModelRegistry::new();
        registry.register("a", &names(&["zeta", "alpha"]));
        let ids: Vec<_> = registry.all_models().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["alpha", "zeta"]);
    }
}
