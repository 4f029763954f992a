use std::error::Error;
use std::fmt;

pub type AdapterResult<T> = Result<T, AdapterError>;

#[derive(Debug, Clone)]
pub enum AdapterError {
    /// The upstream backend failed or returned a non-success status.
    Upstream(String),
    /// The upstream payload could not be decoded.
    Serialization(String),
    /// The adapter cannot be constructed (missing credential, bad base URL).
    InvalidConfig(String),
    Unsupported(&'static str),
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterError::Upstream(msg) => write!(f, "upstream failure: {msg}"),
            AdapterError::Serialization(msg) => write!(f, "malformed upstream payload: {msg}"),
            AdapterError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            AdapterError::Unsupported(what) => write!(f, "unsupported: {what}"),
        }
    }
}

impl Error for AdapterError {}
