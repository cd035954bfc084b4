//! Circular reference detection for variable definitions.
//!
//! Before a variable is rebound we walk the candidate expression, following
//! every variable reference into that variable's *current* definition. If
//! the walk reaches the variable being defined, the definition is rejected.

use std::collections::HashSet;

use super::graph::{ExprId, ExprKind, Graph};

enum Step<'g> {
    Enter(ExprId),
    /// Leaving a variable's definition; drop it from the path.
    Leave,
    /// Checked before `Enter` so the path is extended only when walked.
    Var(&'g str, ExprId),
}

/// Search for a path from `start` back to the variable `target`.
/// Returns the variable names along the path (ending in `target`) if found.
///
/// Uses an explicit stack so long reference chains cannot exhaust the call
/// stack.
pub(crate) fn find_cycle(graph: &Graph, target: &str, start: ExprId) -> Option<Vec<String>> {
    let mut visited = HashSet::new();
    let mut path: Vec<String> = Vec::new();
    let mut stack = vec![Step::Enter(start)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Leave => {
                path.pop();
            }
            Step::Var(name, expr) => {
                path.push(name.to_string());
                stack.push(Step::Leave);
                stack.push(Step::Enter(expr));
            }
            Step::Enter(current) => {
                // A node already explored cannot reach the target now either.
                if !visited.insert(current) {
                    continue;
                }
                match graph.kind(current) {
                    ExprKind::Value(_) => {}
                    ExprKind::VarRef(name) if name == target => {
                        path.push(name.clone());
                        return Some(path);
                    }
                    ExprKind::VarRef(name) => {
                        if let Some(var) = graph.variable(name) {
                            stack.push(Step::Var(name, graph.var(var).expr()));
                        }
                    }
                    ExprKind::FuncCall { args, .. } => {
                        stack.extend(args.iter().rev().map(|arg| Step::Enter(*arg)));
                    }
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cycle_through_values() {
        let mut graph = Graph::new();
        let three = graph.number(3.0);
        assert!(find_cycle(&graph, "x", three).is_none());
    }

    #[test]
    fn test_self_reference() {
        let mut graph = Graph::new();
        let x = graph.var_ref("x");
        assert_eq!(find_cycle(&graph, "x", x), Some(vec!["x".to_string()]));
    }

    #[test]
    fn test_indirect_path_is_reported() {
        let mut graph = Graph::new();
        let a = graph.var_ref("a");
        graph.set_value("b", Some(a)).unwrap();
        let b = graph.var_ref("b");
        graph.set_value("c", Some(b)).unwrap();

        let c = graph.var_ref("c");
        let path = find_cycle(&graph, "a", c).unwrap();
        assert_eq!(path, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_unbound_reference_is_not_a_cycle() {
        let mut graph = Graph::new();
        let y = graph.var_ref("y");
        let call = graph.func_call("+", vec![y, y]);
        assert!(find_cycle(&graph, "x", call).is_none());
    }

    #[test]
    fn test_long_reference_chain() {
        const LEN: usize = 200_000;
        let mut graph = Graph::new();
        // Define front to back so each check stops at an unbound name.
        for i in 0..LEN {
            let next = graph.var_ref(format!("v{}", i + 1));
            graph.set_value(&format!("v{}", i), Some(next)).unwrap();
        }
        let first = graph.var_ref("v0");
        let path = find_cycle(&graph, &format!("v{}", LEN), first).unwrap();
        assert_eq!(path.len(), LEN + 1);
        assert_eq!(path[0], "v0");
        assert!(find_cycle(&graph, "elsewhere", first).is_none());
    }

    #[test]
    fn test_shared_subexpression_visited_once() {
        let mut graph = Graph::new();
        let p = graph.var_ref("p");
        let shared = graph.func_call("+", vec![p, p]);
        graph.set_value("l", Some(shared)).unwrap();
        graph.set_value("r", Some(shared)).unwrap();
        let l = graph.var_ref("l");
        let r = graph.var_ref("r");
        let both = graph.func_call("+", vec![l, r]);
        assert!(find_cycle(&graph, "q", both).is_none());
        assert!(find_cycle(&graph, "p", both).is_some());
    }
}
