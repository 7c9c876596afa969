//! Error types for expression resolution.

use thiserror::Error;

use crate::catalog::OperatorId;
use crate::types::{CollationId, Domain, TypeTag};

/// Errors raised while typing, coercing or folding an expression.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    /// No overload of the operator accepts the argument types
    #[error("operator {op} is not defined on ({})", join(arg_types))]
    OperatorNotDefined {
        op: OperatorId,
        arg_types: Vec<TypeTag>,
    },

    /// An argument cannot be converted to the type its slot requires
    #[error("cannot coerce {node} to {target}")]
    CannotCoerce { node: String, target: Domain },

    /// Operands carry collations that cannot be unified
    #[error("incompatible collations for {op}: {}", join(collations))]
    CollationConflict {
        op: OperatorId,
        collations: Vec<CollationId>,
    },

    #[error("numeric overflow in {op}")]
    NumericOverflow { op: OperatorId },

    #[error("division by zero in {op}")]
    ZeroDivide { op: OperatorId },

    #[error("out of memory")]
    OutOfMemory,

    /// The operator has no catalog entry
    #[error("operator {op} has no type signature")]
    UntypedOperator { op: OperatorId },

    /// Invariant violation inside the resolver
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SemanticError {
    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            SemanticError::OperatorNotDefined { .. } => "E0101",
            SemanticError::CannotCoerce { .. } => "E0102",
            SemanticError::CollationConflict { .. } => "E0103",
            SemanticError::NumericOverflow { .. } => "E0201",
            SemanticError::ZeroDivide { .. } => "E0202",
            SemanticError::OutOfMemory => "E0301",
            SemanticError::UntypedOperator { .. } => "E0104",
            SemanticError::Internal { .. } => "E0901",
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        SemanticError::Internal {
            message: message.into(),
        }
    }
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for resolution steps
pub type SemanticResult<T> = Result<T, SemanticError>;
