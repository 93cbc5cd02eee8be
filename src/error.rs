//! View processing error types.

use thiserror::Error;

/// Errors that can occur while rendering a view arch.
///
/// Every variant is fatal for the call that produced it: the processor never
/// returns a partially rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    /// Raw arch text could not be parsed as a view tree.
    #[error("unable to parse view arch: {reason}\narch: {arch}")]
    MalformedInput { arch: String, reason: String },

    /// A field or label references a name the model does not define.
    #[error("unknown field '{field}' in model '{model}'")]
    UnknownField { model: String, field: String },

    /// An `attrs` declaration is not a mapping of modifier name to domain.
    #[error("invalid attrs definition in model '{model}': {reason}\nattrs: {attrs}")]
    MalformedAttrs {
        model: String,
        attrs: String,
        reason: String,
    },

    /// The processed tree could not be re-encoded.
    #[error("unable to render view arch: {0}")]
    Serialization(String),

    /// No view matches the requested id or model/type pair.
    #[error("view not found: {0}")]
    ViewNotFound(String),

    /// Configuration or model definition could not be loaded.
    #[error("invalid config: {0}")]
    Config(String),
}

impl ViewError {
    /// Whether the error points at a broken view definition rather than a
    /// broken integration (config, registry, renderer).
    pub fn is_view_definition_error(&self) -> bool {
        matches!(
            self,
            ViewError::MalformedInput { .. }
                | ViewError::UnknownField { .. }
                | ViewError::MalformedAttrs { .. }
        )
    }
}
