//! Error types for houdini-component

use houdini_core::{CorrelationId, FieldId, ParameterKind};
use houdini_session::HapiError;
use thiserror::Error;

/// Result type for houdini-component operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reflecting, pushing or cooking
#[derive(Debug, Error)]
pub enum Error {
    /// An engine call failed
    #[error("engine call {call} failed: {source}")]
    Hapi {
        /// Name of the failing call
        call: &'static str,
        source: HapiError,
    },

    /// Scratch arena or value model error
    #[error("core error: {0}")]
    Core(#[from] houdini_core::Error),

    /// Field id not present in the generated schema
    #[error("unknown field {0}")]
    UnknownField(FieldId),

    /// Parameter name not known to the engine
    #[error("engine has no parameter named {0:?}")]
    UnknownParameter(String),

    /// Stored field layout does not match the engine parameter
    #[error("parameter {name:?} has {engine} components, field has {field}")]
    ArityMismatch {
        name: String,
        engine: usize,
        field: usize,
    },

    /// Value of the wrong kind written to a field
    #[error("field {field} holds {expected} values, got {got}")]
    KindMismatch {
        field: String,
        expected: ParameterKind,
        got: ParameterKind,
    },

    /// A second request was about to be submitted while one is outstanding
    #[error("request {0} is still in flight")]
    RequestInFlight(CorrelationId),

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// I/O error while reading configuration
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Map an engine error for the named call
    pub(crate) fn hapi(call: &'static str) -> impl FnOnce(HapiError) -> Error {
        move |source| Error::Hapi { call, source }
    }
}
