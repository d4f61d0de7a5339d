//! Language-level error taxonomy.
//!
//! A [`RuntimeError`] becomes an Error instance when it is raised; see
//! `From<RuntimeError> for Flow`.

use thiserror::Error;

/// Category of a language error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Definition and lookup of names.
    Binding,
    /// An operation a type does not support, or unsupported operand types.
    Operation,
    /// Wrong number of values or an index outside a sequence.
    Arity,
    /// Raised explicitly by a script.
    User,
    /// Broken contracts inside the evaluator or a meta function.
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("'{0}' is already defined in this scope")]
    AlreadyDefined(String),

    #[error("undefined variable '{0}'")]
    Undefined(String),

    #[error("cannot reassign constant '{0}'")]
    ConstantReassignment(String),

    #[error("type {type_name} does not implement action {action}")]
    InvalidAction { type_name: String, action: String },

    #[error("type {type_name} does not implement operation {operation}")]
    InvalidOperation { type_name: String, operation: String },

    #[error("incompatible types for operation {operation}: {left} and {right}")]
    IncompatibleTypes {
        operation: String,
        left: String,
        right: String,
    },

    #[error("type {type_name} has no property '{name}'")]
    NoProperty { type_name: String, name: String },

    #[error("{0} is not callable")]
    NotCallable(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing argument '{0}'")]
    MissingArgument(String),

    #[error("expected {expected} values to unpack, got {got}")]
    ArityMismatch { expected: String, got: usize },

    #[error("index {index} out of bounds for {type_name} of length {len}")]
    OutOfBounds {
        type_name: String,
        index: String,
        len: usize,
    },

    #[error("invalid index: {0}")]
    InvalidIndex(String),

    #[error("{0}")]
    Raised(String),

    #[error("expected {expected} on meta function '{meta}', got {got}")]
    MetaResult {
        meta: String,
        expected: String,
        got: String,
    },

    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("maximum call depth of {0} exceeded")]
    CallDepth(usize),

    #[error("{0}")]
    Internal(String),
}

impl RuntimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::AlreadyDefined(_)
            | RuntimeError::Undefined(_)
            | RuntimeError::ConstantReassignment(_) => ErrorKind::Binding,
            RuntimeError::InvalidAction { .. }
            | RuntimeError::InvalidOperation { .. }
            | RuntimeError::IncompatibleTypes { .. }
            | RuntimeError::NoProperty { .. }
            | RuntimeError::NotCallable(_)
            | RuntimeError::InvalidArgument(_) => ErrorKind::Operation,
            RuntimeError::MissingArgument(_)
            | RuntimeError::ArityMismatch { .. }
            | RuntimeError::OutOfBounds { .. }
            | RuntimeError::InvalidIndex(_) => ErrorKind::Arity,
            RuntimeError::Raised(_) => ErrorKind::User,
            RuntimeError::MetaResult { .. }
            | RuntimeError::InvalidDefinition(_)
            | RuntimeError::CallDepth(_)
            | RuntimeError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn invalid_action(type_name: impl Into<String>, action: impl Into<String>) -> Self {
        RuntimeError::InvalidAction {
            type_name: type_name.into(),
            action: action.into(),
        }
    }

    pub fn invalid_operation(type_name: impl Into<String>, operation: impl Into<String>) -> Self {
        RuntimeError::InvalidOperation {
            type_name: type_name.into(),
            operation: operation.into(),
        }
    }

    pub fn incompatible(
        operation: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        RuntimeError::IncompatibleTypes {
            operation: operation.into(),
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn no_property(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        RuntimeError::NoProperty {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    pub fn out_of_bounds(type_name: impl Into<String>, index: impl ToString, len: usize) -> Self {
        RuntimeError::OutOfBounds {
            type_name: type_name.into(),
            index: index.to_string(),
            len,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        RuntimeError::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            RuntimeError::invalid_operation("Boolean", "+").to_string(),
            "type Boolean does not implement operation +"
        );
        assert_eq!(
            RuntimeError::incompatible("+", "Number", "Boolean").to_string(),
            "incompatible types for operation +: Number and Boolean"
        );
        assert_eq!(
            RuntimeError::MissingArgument("a".into()).to_string(),
            "missing argument 'a'"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(RuntimeError::Undefined("x".into()).kind(), ErrorKind::Binding);
        assert_eq!(RuntimeError::out_of_bounds("Tuple", 5, 3).kind(), ErrorKind::Arity);
        assert_eq!(RuntimeError::Raised("boom".into()).kind(), ErrorKind::User);
        assert_eq!(RuntimeError::CallDepth(10).kind(), ErrorKind::Internal);
    }
}
