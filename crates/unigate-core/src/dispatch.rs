use std::sync::Arc;

use unigate_adapter_core::{ChatAdapter, LoadedAdapters};

use crate::error::GatewayError;

/// Map a requested model name to its loaded adapter instance. Both miss
/// cases (no registry mapping, or a mapped adapter that failed to load at
/// startup) surface as the same not-found condition.
pub(crate) fn resolve(
    adapters: &LoadedAdapters,
    model: &str,
) -> Result<Arc<dyn ChatAdapter>, GatewayError> {
    adapters
        .get(model)
        .ok_or_else(|| GatewayError::ModelNotFound(model.to_string()))
}
