//! Chain assembly.
//!
//! Reads tokens into the flat term/operator chains the precedence resolver
//! consumes. Parenthesised groups and call arguments are resolved
//! recursively and enter the enclosing chain as single terms.

use tally_engine::engine::{ExprId, Graph};
use tally_engine::precedence::{ChainItem, MAX_DEPTH, OperatorTable, resolve_call, resolve_chain};

use super::lexer::{Spanned, Token, tokenize};
use crate::error::{Result, TallyError};

/// Parse formula text into a single expression owned by `graph`.
pub fn parse_formula(graph: &mut Graph, table: &OperatorTable, src: &str) -> Result<ExprId> {
    let tokens = tokenize(src, table.symbols())?;
    let mut parser = Parser {
        graph,
        table,
        tokens,
        pos: 0,
        depth: 0,
    };
    let root = parser.expression()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(TallyError::Syntax(format!(
            "Unexpected {} at column {}",
            describe(&extra.token),
            extra.column
        )));
    }
    Ok(root)
}

struct Parser<'g, 't> {
    graph: &'g mut Graph,
    table: &'t OperatorTable,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser<'_, '_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn bump(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Enter a group or argument list, refusing to nest past [`MAX_DEPTH`].
    fn descend(&mut self, column: usize) -> Result<()> {
        if self.depth == MAX_DEPTH {
            return Err(TallyError::Syntax(format!(
                "Formula nested deeper than {} levels at column {}",
                MAX_DEPTH, column
            )));
        }
        self.depth += 1;
        Ok(())
    }

    fn expression(&mut self) -> Result<ExprId> {
        let chain = self.chain()?;
        Ok(resolve_chain(self.graph, self.table, chain)?)
    }

    /// Collect terms and operators up to `)`, `,` or end of input.
    fn chain(&mut self) -> Result<Vec<ChainItem>> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            match token {
                Token::RParen | Token::Comma => break,
                Token::Operator(op) => {
                    items.push(ChainItem::Operator(op.clone()));
                    self.pos += 1;
                }
                _ => items.push(ChainItem::Term(self.primary()?)),
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<ExprId> {
        let Some(Spanned { token, column }) = self.bump() else {
            return Err(TallyError::Syntax("Unexpected end of formula".to_string()));
        };
        match token {
            Token::Number(n) => Ok(self.graph.number(n)),
            Token::Str(s) => Ok(self.graph.string(s)),
            Token::Ident(name) => {
                let keyword = match name.as_str() {
                    "true" => Some(self.graph.bool(true)),
                    "false" => Some(self.graph.bool(false)),
                    "null" => Some(self.graph.null()),
                    _ => None,
                };
                if let Some(literal) = keyword {
                    return Ok(literal);
                }
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.descend(column)?;
                    let args = self.arguments()?;
                    self.depth -= 1;
                    return Ok(resolve_call(self.graph, self.table, name, args)?);
                }
                Ok(self.graph.var_ref(name))
            }
            Token::LParen => {
                self.descend(column)?;
                let inner = self.expression()?;
                self.expect_close(column)?;
                self.depth -= 1;
                Ok(inner)
            }
            other => Err(TallyError::Syntax(format!(
                "Unexpected {} at column {}",
                describe(&other),
                column
            ))),
        }
    }

    /// Argument chains after an opening parenthesis, through the closing one.
    fn arguments(&mut self) -> Result<Vec<Vec<ChainItem>>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.chain()?);
            match self.bump() {
                Some(Spanned {
                    token: Token::Comma,
                    ..
                }) => continue,
                Some(Spanned {
                    token: Token::RParen,
                    ..
                }) => return Ok(args),
                _ => return Err(TallyError::Syntax("Unclosed argument list".to_string())),
            }
        }
    }

    fn expect_close(&mut self, open_column: usize) -> Result<()> {
        match self.bump() {
            Some(Spanned {
                token: Token::RParen,
                ..
            }) => Ok(()),
            _ => Err(TallyError::Syntax(format!(
                "Unclosed '(' at column {}",
                open_column
            ))),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Number(n) => format!("number {}", n),
        Token::Str(_) => "string".to_string(),
        Token::Ident(name) => format!("'{}'", name),
        Token::Operator(op) => format!("'{}'", op),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::Comma => "','".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_operators;
    use tally_engine::ResolveError;
    use tally_engine::builtins::register_builtins;
    use tally_engine::engine::{Value, render_expr};
    use tally_engine::precedence::OperatorSpec;

    fn spec_table() -> OperatorTable {
        OperatorTable::new()
            .with("+", OperatorSpec::left(10).with_prefix(100))
            .with("-", OperatorSpec::left(10).with_prefix(100))
            .with("*", OperatorSpec::left(30))
            .with("/", OperatorSpec::left(30))
            .with("^", OperatorSpec::left(40))
            .with("|", OperatorSpec::left(50))
    }

    fn render(src: &str) -> String {
        let mut graph = Graph::new();
        let root = parse_formula(&mut graph, &spec_table(), src).unwrap();
        render_expr(&graph, root)
    }

    fn eval(src: &str) -> Value {
        let mut graph = Graph::new();
        register_builtins(&mut graph);
        let root = parse_formula(&mut graph, &default_operators(), src).unwrap();
        graph.latest_value(root).unwrap()
    }

    #[test]
    fn test_chains() {
        assert_eq!(render("1 + 2 + 3"), "+(+(1, 2), 3)");
        assert_eq!(render("- 3"), "-(3)");
        assert_eq!(render("func(- 3 + - 5, true)"), "func(+(-(3), -(5)), true)");
    }

    #[test]
    fn test_groups_and_references() {
        assert_eq!(render("(1 + 2) * x"), "*(+(1, 2), x)");
        assert_eq!(render("f()"), "f()");
        assert_eq!(render("f(g(a), \"s\", null)"), "f(g(a), \"s\", null)");
    }

    #[test]
    fn test_evaluation_with_default_table() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("2 ^ 3 ^ 2"), Value::Number(512.0));
        assert_eq!(eval("-(2 + 3) * 2"), Value::Number(-10.0));
        assert_eq!(eval("!false & 1 < 2"), Value::Bool(true));
        assert_eq!(eval("IF(1 == 1, \"yes\", \"no\")"), Value::from("yes"));
    }

    #[test]
    fn test_syntax_errors() {
        let mut graph = Graph::new();
        let table = spec_table();
        assert!(matches!(
            parse_formula(&mut graph, &table, "(1 + 2"),
            Err(TallyError::Syntax(_))
        ));
        assert!(matches!(
            parse_formula(&mut graph, &table, "f(1, 2"),
            Err(TallyError::Syntax(_))
        ));
        assert!(matches!(
            parse_formula(&mut graph, &table, "1 + 2)"),
            Err(TallyError::Syntax(_))
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let mut graph = Graph::new();
        let table = spec_table();
        let groups = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(
            parse_formula(&mut graph, &table, &groups),
            Err(TallyError::Syntax(msg)) if msg.contains("nested")
        ));
        let calls = format!("{}1{}", "f(".repeat(200_000), ")".repeat(200_000));
        assert!(matches!(
            parse_formula(&mut graph, &table, &calls),
            Err(TallyError::Syntax(msg)) if msg.contains("nested")
        ));
        let prefixes = format!("{}1", "-".repeat(200_000));
        assert!(matches!(
            parse_formula(&mut graph, &table, &prefixes),
            Err(TallyError::Resolve(ResolveError::TooDeep(_)))
        ));

        let shallow = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(render(&shallow), "1");
    }

    #[test]
    fn test_word_operator_from_table() {
        let mut graph = Graph::new();
        let table = spec_table().with("and", OperatorSpec::left(4));
        let root = parse_formula(&mut graph, &table, "true and x + 1").unwrap();
        assert_eq!(render_expr(&graph, root), "and(true, +(x, 1))");
        let root = parse_formula(&mut graph, &table, "android").unwrap();
        assert_eq!(render_expr(&graph, root), "android");
    }

    #[test]
    fn test_resolver_errors_surface() {
        let mut graph = Graph::new();
        let table = spec_table();
        assert!(matches!(
            parse_formula(&mut graph, &table, "1 ? 2"),
            Err(TallyError::Resolve(ResolveError::UnknownOperator(op))) if op == "?"
        ));
        assert!(matches!(
            parse_formula(&mut graph, &table, "* 2"),
            Err(TallyError::Resolve(ResolveError::NotPrefix(_)))
        ));
        assert!(matches!(
            parse_formula(&mut graph, &table, ""),
            Err(TallyError::Resolve(ResolveError::UnexpectedEnd))
        ));
    }
}
