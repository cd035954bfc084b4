//! Line-level statements: `name = formula`, `name =`, or a bare formula.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement<'a> {
    Define { name: &'a str, formula: &'a str },
    Clear { name: &'a str },
    Evaluate(&'a str),
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

pub fn is_identifier(name: &str) -> bool {
    !matches!(name, "true" | "false" | "null") && identifier_re().is_match(name)
}

/// Classify one line. `a == b` is a comparison, not a definition.
pub fn parse_statement(line: &str) -> Statement<'_> {
    let trimmed = line.trim();
    if let Some((lhs, rhs)) = trimmed.split_once('=') {
        let name = lhs.trim();
        if !rhs.starts_with('=') && is_identifier(name) {
            let formula = rhs.trim();
            if formula.is_empty() {
                return Statement::Clear { name };
            }
            return Statement::Define { name, formula };
        }
    }
    Statement::Evaluate(trimmed)
}
