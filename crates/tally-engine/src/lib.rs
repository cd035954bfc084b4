//! tally_engine - Expression graph, precedence resolver and built-in functions.

pub mod builtins;
pub mod engine;
pub mod error;
pub mod precedence;

pub use error::{FunctionError, GraphError, ResolveError, Result};
