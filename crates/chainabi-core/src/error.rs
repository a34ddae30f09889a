//! Error types for the ChainABI decode pipeline, registry and chain client.

use thiserror::Error;

/// Errors that can occur while decoding a single call or log against an
/// interface definition.
///
/// `NoMatch` and `AbiDecodeFailed` are recovered inside multi-interface
/// search loops; `NotConfigured` always propagates to the caller.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The interface has no method/event for this selector or topic.
    #[error("No {kind} found for {id}")]
    NoMatch { kind: &'static str, id: String },

    /// The selector or topic resolved, but the arguments did not unpack.
    #[error("ABI decode failed for {signature}: {reason}")]
    AbiDecodeFailed { signature: String, reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A decode was requested with no interface definition loaded at all.
    #[error("No interface definition loaded")]
    NotConfigured,
}

impl DecodeError {
    pub fn no_method(selector: &[u8]) -> Self {
        Self::NoMatch {
            kind: "method",
            id: format!("selector 0x{}", hex::encode(selector)),
        }
    }

    pub fn no_event(topic: &str) -> Self {
        Self::NoMatch {
            kind: "event",
            id: format!("topic {topic}"),
        }
    }

    /// Returns `true` if the interface simply does not know this call/log.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch { .. })
    }

    /// Returns `true` if the search over further candidates may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NoMatch { .. } | Self::AbiDecodeFailed { .. })
    }
}

/// Errors from parsing and loading interface definitions.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Parse error in ABI JSON: {0}")]
    Parse(String),

    #[error("Unrecognized type '{ty}' for parameter '{param}' of {entry}")]
    UnknownType {
        entry: String,
        param: String,
        ty: String,
    },

    #[error("Interface '{name}' not found")]
    NotFound { name: String },

    #[error("Interface '{name}' is already registered")]
    AlreadyExists { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Errors reported by a [`ChainClient`](crate::client::ChainClient).
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// No backing chain client has been configured.
    #[error("No chain client configured")]
    NotConfigured,

    /// The call did not complete within the configured bound.
    #[error("Chain client call timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Connection, HTTP or framing failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The node answered with a JSON-RPC error (e.g. execution reverted).
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Returns `true` if the collaborator itself is missing or unreachable,
    /// as opposed to the node rejecting this particular request.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured | Self::Timeout { .. } | Self::Transport(_)
        )
    }
}
