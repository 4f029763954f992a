//! Backend adapter abstractions for unigate.
//!
//! An adapter speaks one upstream chat protocol and exposes the two-operation
//! capability contract the gateway depends on: produce a full reply, or
//! produce an incremental fragment stream. This crate holds that contract,
//! the model registry mapping model names to adapter names, and the loader
//! that instantiates every declared adapter once at process start. It does
//! not depend on axum or any concrete HTTP client.

pub mod adapter;
pub mod errors;
pub mod loader;
pub mod registry;

pub use adapter::{ChatAdapter, FragmentStream, SendOptions};
pub use errors::{AdapterError, AdapterResult};
pub use loader::{AdapterFactory, LoadedAdapters, load_all};
pub use registry::ModelRegistry;
