//! Concrete backend adapters.
//!
//! One module per upstream backend, each registering through an
//! [`AdapterFactory`] with an explicit declared name. Remote backends share
//! the wreq-based chat client in `http_client`; the echo backend is local
//! and deterministic.

mod http_client;

pub mod echo;
pub mod openai;
pub mod qianfan;

pub use echo::EchoAdapter;
pub use openai::OpenAiAdapter;
pub use qianfan::QianfanAdapter;

use unigate_adapter_core::AdapterFactory;

/// Every adapter this build ships, in registration order. A later entry wins
/// a name collision.
pub fn default_factories() -> Vec<AdapterFactory> {
    vec![
        EchoAdapter::factory(),
        QianfanAdapter::factory(),
        OpenAiAdapter::factory(),
    ]
}
