use std::sync::Arc;

use async_trait::async_trait;

use unigate_adapter_core::{
    AdapterError, AdapterFactory, AdapterResult, ChatAdapter, FragmentStream, SendOptions,
    load_all,
};
use unigate_protocol::ChatMessage;

struct StaticAdapter {
    models: Vec<String>,
    reply: &'static str,
}

impl StaticAdapter {
    fn boxed(models: &[&str], reply: &'static str) -> Arc<dyn ChatAdapter> {
        Arc::new(Self {
            models: models.iter().map(|m| m.to_string()).collect(),
            reply,
        })
    }
}

#[async_trait]
impl ChatAdapter for StaticAdapter {
    fn supported_models(&self) -> &[String] {
        &self.models
    }

    async fn send_message(
        &self,
        _conversation: &[ChatMessage],
        _options: &SendOptions,
    ) -> AdapterResult<String> {
        Ok(self.reply.to_string())
    }

    async fn send_message_stream(
        &self,
        _conversation: &[ChatMessage],
        _options: &SendOptions,
    ) -> AdapterResult<FragmentStream> {
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx.try_send(Ok(self.reply.to_string()));
        Ok(rx)
    }
}

#[test]
fn failing_factory_is_skipped() {
    let loaded = load_all(vec![
        AdapterFactory::new("alpha", || Ok(StaticAdapter::boxed(&["alpha-1"], "a"))),
        AdapterFactory::new("broken", || {
            Err(AdapterError::InvalidConfig("no credential".to_string()))
        }),
    ]);

    assert_eq!(loaded.len(), 1);
    assert!(loaded.get("alpha-1").is_some());

    let listed = loaded.registry().all_models();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "alpha-1");
    assert_eq!(listed[0].owned_by, "alpha");
}

#[test]
fn duplicate_name_last_registration_wins() {
    let loaded = load_all(vec![
        AdapterFactory::new("twin", || Ok(StaticAdapter::boxed(&["twin-old"], "old"))),
        AdapterFactory::new("twin", || Ok(StaticAdapter::boxed(&["twin-new"], "new"))),
    ]);

    assert_eq!(loaded.len(), 1);
    assert!(loaded.get("twin-new").is_some());
    // The replaced instance's models are gone with it.
    assert!(loaded.get("twin-old").is_none());
}

#[test]
fn resolution_is_stable_across_calls() {
    let loaded = load_all(vec![AdapterFactory::new("alpha", || {
        Ok(StaticAdapter::boxed(&["alpha-1"], "a"))
    })]);

    let first = loaded.get("alpha-1").expect("registered model resolves");
    let second = loaded.get("alpha-1").expect("registered model resolves");
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn unknown_model_resolves_to_none() {
    let loaded = load_all(vec![AdapterFactory::new("alpha", || {
        Ok(StaticAdapter::boxed(&["alpha-1"], "a"))
    })]);
    assert!(loaded.get("ghost-model").is_none());
}

#[test]
fn empty_factory_list_loads_nothing() {
    let loaded = load_all(Vec::new());
    assert!(loaded.is_empty());
    assert!(loaded.registry().is_empty());
}
