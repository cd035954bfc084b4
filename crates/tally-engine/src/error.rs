//! Error types for the Tally engine.

use thiserror::Error;

/// Errors raised by the expression graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Redefining `name` would make it depend on itself. `path` lists the
    /// variables walked from the new definition back to `name`.
    #[error("Circular reference: {name} would depend on itself via {}", path.join(" -> "))]
    CircularReference { name: String, path: Vec<String> },

    #[error("Invalid reference: no function named '{0}'")]
    InvalidReference(String),

    #[error("Error in {name}: {source}")]
    Function {
        name: String,
        #[source]
        source: FunctionError,
    },
}

/// Errors returned by native function bodies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FunctionError {
    #[error("expected {expected} argument(s), got {found}")]
    Arity { expected: String, found: usize },

    #[error("expected {expected}, got {found}")]
    Type {
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0}")]
    Domain(String),
}

/// Errors raised while resolving an operator chain into a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("'{0}' is not a valid prefix operator")]
    NotPrefix(String),

    #[error("'{0}' is non-associative and cannot be used infix")]
    NonAssociative(String),

    #[error("'{0}' cannot be used as an infix operator")]
    NotInfix(String),

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Expected an operator between terms")]
    ExpectedOperator,

    #[error("Expression nested deeper than {0} levels")]
    TooDeep(usize),
}

pub type Result<T> = std::result::Result<T, GraphError>;
