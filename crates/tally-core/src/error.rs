//! Error types for Tally core.

use tally_engine::{GraphError, ResolveError};
use thiserror::Error;

/// Errors that can occur in a Tally document
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Lex error at column {column}: {message}")]
    Lex { column: usize, message: String },

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

pub type Result<T> = std::result::Result<T, TallyError>;
