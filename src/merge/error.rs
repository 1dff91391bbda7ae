//! Merge error taxonomy.
//!
//! Every merge failure is a single fail-fast error. Context is layered on
//! as the error propagates out of the entity tree, so the final message
//! reads outermost-first: which extension, which named entity, which field
//! group, and finally the offending key.

use serde_yaml::Value;
use thiserror::Error;

/// Stable category of a merge failure, independent of the context chain.
///
/// These categories are stable and used for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeErrorKind {
    /// The extension names an entity the base descriptor does not define.
    UnknownEntity,
    /// The extension tried to replace a protected field that already has a
    /// value.
    NotOverwritable,
    /// A structured value collided with a scalar value (either direction).
    ShapeConflict,
}

/// Error returned by a failed merge.
///
/// The base document may have been partially mutated by the time the error
/// is produced; callers must not reuse it after a failure.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The extension refers to a named entity that does not exist in the
    /// base descriptor. The payload is a rendered entity reference such as
    /// `"cache" resource` or `"poll" hook in the "web" module`.
    #[error("the {0} is defined in the extension descriptor but not in the base descriptor")]
    UnknownEntity(String),

    #[error("the \"{0}\" field is not overwritable")]
    NotOverwritable(String),

    #[error("\"{0}\": cannot overwrite a structured value with a scalar value")]
    StructuredOverScalar(String),

    #[error("\"{0}\": cannot overwrite a scalar value with a structured value")]
    ScalarOverStructured(String),

    /// A contextualized wrapper around one of the failures above. The
    /// rendered message embeds the full cause chain, so the wrapper does
    /// not additionally expose it through `Error::source`.
    #[error("{context}: {cause}")]
    Context {
        context: String,
        cause: Box<MergeError>,
    },
}

impl MergeError {
    pub(crate) fn unknown(entity: String) -> Self {
        MergeError::UnknownEntity(entity)
    }

    /// Wrap this error with one more layer of context.
    pub(crate) fn context(self, context: impl Into<String>) -> Self {
        MergeError::Context {
            context: context.into(),
            cause: Box::new(self),
        }
    }

    /// Wrap a nested-map error with the key it occurred under, so dotted
    /// paths accumulate as the recursion unwinds.
    pub(crate) fn under_key(self, key: &Value) -> Self {
        self.context(format!("\"{}\"", key_display(key)))
    }

    /// The root category of this error, looking through any context layers.
    pub fn kind(&self) -> MergeErrorKind {
        match self {
            MergeError::UnknownEntity(_) => MergeErrorKind::UnknownEntity,
            MergeError::NotOverwritable(_) => MergeErrorKind::NotOverwritable,
            MergeError::StructuredOverScalar(_) | MergeError::ScalarOverStructured(_) => {
                MergeErrorKind::ShapeConflict
            }
            MergeError::Context { cause, .. } => cause.kind(),
        }
    }
}

/// Render a mapping key for error messages. Keys are almost always strings;
/// non-string keys fall back to their YAML rendering.
pub(crate) fn key_display(key: &Value) -> String {
    match key.as_str() {
        Some(s) => s.to_string(),
        None => serde_yaml::to_string(key)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| "<non-scalar key>".to_string()),
    }
}
