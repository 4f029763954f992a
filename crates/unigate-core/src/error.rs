use std::error::Error;
use std::fmt;

#[derive(Debug, Clone)]
pub enum GatewayError {
    /// No registry mapping for the requested model, or its adapter never
    /// loaded. Client-facing not-found, never a crash.
    ModelNotFound(String),
    /// The resolved adapter failed against its backend.
    Upstream(String),
}

impl GatewayError {
    /// HTTP status the router answers with.
    pub fn status(&self) -> u16 {
        match self {
            GatewayError::ModelNotFound(_) => 404,
            GatewayError::Upstream(_) => 500,
        }
    }

    /// Machine-readable error tag for the OpenAI-style error payload.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::ModelNotFound(_) => "model_not_found",
            GatewayError::Upstream(_) => "upstream_error",
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::ModelNotFound(model) => write!(f, "model {model} not found"),
            GatewayError::Upstream(msg) => f.write_str(msg),
        }
    }
}

impl Error for GatewayError {}
