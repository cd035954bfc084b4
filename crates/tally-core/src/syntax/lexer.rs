//! Formula tokenizer.
//!
//! Operator symbols are matched longest-first against the active operator
//! table. A symbol character that starts no known operator still becomes a
//! one-character operator token, so the resolver can report it by name.
//! A whole identifier that spells a table symbol (`and`, `mod`) is an
//! operator too.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Result, TallyError};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Operator(String),
    LParen,
    RParen,
    Comma,
}

/// A token and the 1-based column it starts at.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub column: usize,
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?").unwrap()
    })
}

fn ident_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap())
}

fn is_symbol_char(ch: char) -> bool {
    ch.is_ascii_punctuation() && !matches!(ch, '(' | ')' | ',' | '"' | '_' | '.')
}

/// Tokenize `src`, recognising the given operator symbols.
pub fn tokenize<'a, I>(src: &str, operators: I) -> Result<Vec<Spanned>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut symbols: Vec<&str> = operators.into_iter().collect();
    symbols.sort_by_key(|s| std::cmp::Reverse(s.len()));

    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut column = 1;

    while pos < src.len() {
        let rest = &src[pos..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        if ch.is_whitespace() {
            pos += ch.len_utf8();
            column += 1;
            continue;
        }

        let (token, len) = match ch {
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            ',' => (Token::Comma, 1),
            '"' => lex_string(rest, column)?,
            _ => {
                if let Some(m) = number_re().find(rest) {
                    let n = m.as_str().parse::<f64>().map_err(|e| TallyError::Lex {
                        column,
                        message: format!("Invalid number '{}': {}", m.as_str(), e),
                    })?;
                    (Token::Number(n), m.end())
                } else if let Some(m) = ident_re().find(rest) {
                    let word = m.as_str().to_string();
                    if symbols.iter().any(|s| *s == word) {
                        (Token::Operator(word), m.end())
                    } else {
                        (Token::Ident(word), m.end())
                    }
                } else if let Some(sym) = symbols
                    .iter()
                    .find(|s| !s.is_empty() && rest.starts_with(**s))
                {
                    (Token::Operator(sym.to_string()), sym.len())
                } else if is_symbol_char(ch) {
                    (Token::Operator(ch.to_string()), ch.len_utf8())
                } else {
                    return Err(TallyError::Lex {
                        column,
                        message: format!("Unexpected character '{}'", ch),
                    });
                }
            }
        };

        tokens.push(Spanned { token, column });
        column += rest[..len].chars().count();
        pos += len;
    }

    Ok(tokens)
}

/// Lex a double-quoted string at the start of `rest`. Returns the token and
/// the number of bytes consumed.
fn lex_string(rest: &str, column: usize) -> Result<(Token, usize)> {
    let mut out = String::new();
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, ch)) = chars.next() {
        match ch {
            '"' => return Ok((Token::Str(out), i + 1)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, '"')) => out.push('"'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, other)) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            },
            _ => out.push(ch),
        }
    }
    Err(TallyError::Lex {
        column,
        message: "Unterminated string".to_string(),
    })
}
