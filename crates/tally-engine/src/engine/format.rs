use super::graph::{ExprId, ExprKind, Graph};
use super::value::Value;

/// Format a number for display.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "#NAN!".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "#INF!" } else { "-#INF!" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Render an expression tree in prefix call form, e.g. `+(+(1, 2), 3)`.
///
/// Strings are quoted so that `"1"` and `1` stay distinguishable.
pub fn render_expr(graph: &Graph, id: ExprId) -> String {
    enum Piece<'g> {
        Expr(ExprId),
        Text(&'g str),
    }

    let mut out = String::new();
    let mut stack = vec![Piece::Expr(id)];
    while let Some(piece) = stack.pop() {
        let id = match piece {
            Piece::Text(text) => {
                out.push_str(text);
                continue;
            }
            Piece::Expr(id) => id,
        };
        match graph.kind(id) {
            ExprKind::Value(Value::Str(s)) => push_quoted(s, &mut out),
            ExprKind::Value(v) => out.push_str(&v.to_string()),
            ExprKind::VarRef(name) => out.push_str(name),
            ExprKind::FuncCall { name, args } => {
                out.push_str(name);
                out.push('(');
                stack.push(Piece::Text(")"));
                for (i, arg) in args.iter().enumerate().rev() {
                    stack.push(Piece::Expr(*arg));
                    if i > 0 {
                        stack.push(Piece::Text(", "));
                    }
                }
            }
        }
    }
    out
}

fn push_quoted(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(2.25), "2.25");
        assert_eq!(format_number(f64::NAN), "#NAN!");
        assert_eq!(format_number(f64::INFINITY), "#INF!");
    }

    #[test]
    fn test_render_quotes_strings() {
        let mut graph = Graph::new();
        let s = graph.string("a\"b");
        let n = graph.number(2.0);
        let call = graph.func_call("CONCAT", vec![s, n]);
        assert_eq!(render_expr(&graph, call), "CONCAT(\"a\\\"b\", 2)");
    }

    #[test]
    fn test_render_deep_tree() {
        let mut graph = Graph::new();
        let mut expr = graph.one();
        for _ in 0..100_000 {
            expr = graph.func_call("-", vec![expr]);
        }
        let rendered = render_expr(&graph, expr);
        assert!(rendered.starts_with("-(-(-(1"));
        assert_eq!(rendered.len(), 100_000 * 3 + 1);
    }
}
