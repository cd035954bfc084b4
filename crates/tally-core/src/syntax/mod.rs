//! Formula front end.
//!
//! - [`tokenize`] - Split formula text into [`Token`]s
//! - [`parse_formula`] - Build chains from tokens and resolve them into the graph
//! - [`parse_statement`] - Recognise `name = formula` definitions

mod lexer;
mod parser;
mod statement;

pub use lexer::{Spanned, Token, tokenize};
pub use parser::parse_formula;
pub use statement::{Statement, is_identifier, parse_statement};
