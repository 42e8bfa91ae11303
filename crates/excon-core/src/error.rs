//! Error types for excon
//!
//! All fallible operations return `Result<T, Error>`.
//! Two kinds are kept apart: declaration defects (a malformed schema or a
//! misused contract) and contract violations (a well-formed schema that a
//! value does not satisfy).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value failed to conform to a well-formed schema.
///
/// The Display form is the complete diagnostic, e.g.
/// `expected a str, got a int`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractViolation {
    /// Runtime type of the value is not the expected type or a subtype
    #[error("expected a {expected}, got a {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// A nested tuple has the wrong number of elements
    #[error("expected a {expected}-ple, got a {actual}-ple")]
    ArityMismatch { expected: usize, actual: usize },

    /// A contract value whose schemas differ from the expected contract
    #[error("expected {expected}, got {actual}")]
    ValueMismatch { expected: String, actual: String },
}

/// excon error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The schema itself is malformed (declaration defect)
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A definition was applied to something other than a single callable
    #[error("invalid binding: {0}")]
    InvalidBinding(String),

    /// A value that cannot be invoked was called
    #[error("'{found}' object is not callable")]
    NotCallable { found: String },

    /// A function was invoked with the wrong number of arguments
    #[error("{function}() takes exactly {expected} argument{} ({given} given)", plural(.expected))]
    ArgumentCount {
        function: String,
        expected: usize,
        given: usize,
    },

    /// Schema matched was not satisfied by the value
    #[error(transparent)]
    Violation(#[from] ContractViolation),

    /// Failure raised by a wrapped function body
    #[error("execution error: {0}")]
    Execution(String),

    /// JSON interop failure
    #[error("conversion error: {0}")]
    Conversion(String),
}

fn plural(n: &usize) -> &'static str {
    if *n == 1 {
        ""
    } else {
        "s"
    }
}

impl Error {
    /// True for data-time failures: the value did not satisfy the schema.
    pub fn is_violation(&self) -> bool {
        matches!(self, Error::Violation(_))
    }

    /// True for programming-time failures that are fixed at development
    /// time rather than handled at runtime.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidSchema(_)
                | Error::InvalidBinding(_)
                | Error::NotCallable { .. }
                | Error::ArgumentCount { .. }
        )
    }

    /// The underlying violation, if this is one.
    pub fn violation(&self) -> Option<&ContractViolation> {
        match self {
            Error::Violation(v) => Some(v),
            _ => None,
        }
    }
}

/// Result type alias for excon operations
pub type Result<T> = std::result::Result<T, Error>;
