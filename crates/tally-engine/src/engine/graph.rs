//! Arena-backed expression graph.
//!
//! Every expression and variable lives in a [`Graph`] and is addressed by a
//! small `Copy` handle. Expression nodes never change after construction;
//! only a [`Var`]'s defining expression is rebound, through
//! [`Graph::set_value`], which bumps the graph generation and thereby
//! invalidates every memoized result.

use log::{debug, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::cycle::find_cycle;
use super::units::{Units, UnitsId, UnitsRegistry};
use super::value::Value;
use crate::error::{FunctionError, GraphError, Result};

/// A native function body: receives the graph and the already-evaluated
/// arguments.
pub type NativeFn = Rc<dyn Fn(&Graph, &[Value]) -> std::result::Result<Value, FunctionError>>;

/// Handle to an expression node. Only meaningful for the graph that made it.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ExprId(u32);

/// Handle to a named variable slot.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct VarId(u32);

/// The closed set of expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// A literal; evaluates to itself.
    Value(Value),
    /// A by-name reference to a variable, resolved at evaluation time.
    VarRef(String),
    /// A named native function applied to owned child expressions.
    FuncCall { name: String, args: Vec<ExprId> },
}

#[derive(Debug, Default)]
pub(crate) struct Memo {
    pub(crate) generation: u64,
    pub(crate) value: Value,
}

#[derive(Debug)]
pub(crate) struct ExprNode {
    pub(crate) kind: ExprKind,
    pub(crate) memo: RefCell<Memo>,
}

/// A named, mutable slot holding one expression as its current definition.
#[derive(Clone, Debug)]
pub struct Var {
    name: String,
    expr: ExprId,
}

impl Var {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current defining expression.
    pub fn expr(&self) -> ExprId {
        self.expr
    }
}

/// Owning container for the expressions, variables, functions and units of
/// one session.
///
/// Not thread-safe: memo cells are read and written without
/// synchronization, so a graph must stay on one thread (or behind one lock).
pub struct Graph {
    exprs: Vec<ExprNode>,
    vars: Vec<Var>,
    var_index: HashMap<String, VarId>,
    functions: HashMap<String, NativeFn>,
    units: UnitsRegistry,
    generation: u64,
    null: ExprId,
    zero: ExprId,
    one: ExprId,
    true_: ExprId,
    false_: ExprId,
}

impl Graph {
    /// Create an empty graph holding only the literal singletons.
    pub fn new() -> Self {
        let mut graph = Graph {
            exprs: Vec::new(),
            vars: Vec::new(),
            var_index: HashMap::new(),
            functions: HashMap::new(),
            units: UnitsRegistry::new(),
            // Memos start at generation 0, so everything is stale on first read.
            generation: 1,
            null: ExprId(0),
            zero: ExprId(0),
            one: ExprId(0),
            true_: ExprId(0),
            false_: ExprId(0),
        };
        graph.null = graph.alloc(ExprKind::Value(Value::Null));
        graph.zero = graph.alloc(ExprKind::Value(Value::Number(0.0)));
        graph.one = graph.alloc(ExprKind::Value(Value::Number(1.0)));
        graph.true_ = graph.alloc(ExprKind::Value(Value::Bool(true)));
        graph.false_ = graph.alloc(ExprKind::Value(Value::Bool(false)));
        graph
    }

    fn alloc(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(ExprNode {
            kind,
            memo: RefCell::new(Memo::default()),
        });
        id
    }

    pub(crate) fn node(&self, id: ExprId) -> &ExprNode {
        &self.exprs[id.0 as usize]
    }

    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.node(id).kind
    }

    /// Current generation. Bumped by every successful [`Graph::set_value`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // Literal singletons.

    pub fn null(&self) -> ExprId {
        self.null
    }

    pub fn zero(&self) -> ExprId {
        self.zero
    }

    pub fn one(&self) -> ExprId {
        self.one
    }

    pub fn bool(&self, b: bool) -> ExprId {
        if b { self.true_ } else { self.false_ }
    }

    /// Build a number literal. `0` and `1` return the shared singletons.
    pub fn number(&mut self, n: f64) -> ExprId {
        if n == 0.0 && n.is_sign_positive() {
            self.zero
        } else if n == 1.0 {
            self.one
        } else {
            self.alloc(ExprKind::Value(Value::Number(n)))
        }
    }

    pub fn string(&mut self, s: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::Value(Value::Str(s.into())))
    }

    /// Build a literal node for any value, reusing singletons where they exist.
    pub fn literal(&mut self, value: Value) -> ExprId {
        match value {
            Value::Null => self.null,
            Value::Bool(b) => self.bool(b),
            Value::Number(n) => self.number(n),
            Value::Str(s) => self.string(s),
        }
    }

    /// Build a reference to the variable `name`. The variable need not exist.
    pub fn var_ref(&mut self, name: impl Into<String>) -> ExprId {
        self.alloc(ExprKind::VarRef(name.into()))
    }

    /// Build a call node. The function name is not checked until evaluation.
    pub fn func_call(&mut self, name: impl Into<String>, args: Vec<ExprId>) -> ExprId {
        debug_assert!(args.iter().all(|a| (a.0 as usize) < self.exprs.len()));
        self.alloc(ExprKind::FuncCall {
            name: name.into(),
            args,
        })
    }

    // Functions.

    /// Install `f` under `name`, replacing any earlier registration.
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Graph, &[Value]) -> std::result::Result<Value, FunctionError> + 'static,
    {
        self.functions.insert(name.into(), Rc::new(f));
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub(crate) fn function(&self, name: &str) -> Option<&NativeFn> {
        self.functions.get(name)
    }

    // Units.

    /// Intern a units descriptor. Order of names within each set is irrelevant.
    pub fn intern_units<N, D>(&mut self, num: N, den: D) -> UnitsId
    where
        N: IntoIterator,
        N::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        self.units.intern(num, den)
    }

    pub fn units(&self, id: UnitsId) -> &Units {
        self.units.get(id)
    }

    // Variables.

    pub fn variable(&self, name: &str) -> Option<VarId> {
        self.var_index.get(name).copied()
    }

    /// Look up `name`, creating a NULL-bound variable if it does not exist.
    pub fn variable_or_create(&mut self, name: &str) -> VarId {
        if let Some(id) = self.variable(name) {
            return id;
        }
        let id = VarId(self.vars.len() as u32);
        self.vars.push(Var {
            name: name.to_string(),
            expr: self.null,
        });
        self.var_index.insert(name.to_string(), id);
        id
    }

    pub fn var(&self, id: VarId) -> &Var {
        &self.vars[id.0 as usize]
    }

    /// All variables in creation order.
    pub fn variables(&self) -> impl Iterator<Item = (VarId, &Var)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, var)| (VarId(i as u32), var))
    }

    /// Bind `name` to `expr` (NULL when `None`).
    ///
    /// Fails with [`GraphError::CircularReference`] if `expr` can reach
    /// `name` through variable references; the previous binding is kept.
    pub fn set_value(&mut self, name: &str, expr: Option<ExprId>) -> Result<VarId> {
        let expr = expr.unwrap_or(self.null);
        let id = self.variable_or_create(name);

        if let Some(path) = find_cycle(self, name, expr) {
            warn!("rejected definition of {}: cycle via {}", name, path.join(" -> "));
            return Err(GraphError::CircularReference {
                name: name.to_string(),
                path,
            });
        }

        self.vars[id.0 as usize].expr = expr;
        self.generation += 1;
        debug!("bound {} (generation {})", name, self.generation);
        Ok(id)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singletons_are_shared() {
        let mut graph = Graph::new();
        assert_eq!(graph.bool(true), graph.bool(true));
        assert_eq!(graph.number(0.0), graph.zero());
        assert_eq!(graph.number(1.0), graph.one());
        assert_eq!(graph.literal(Value::Null), graph.null());
        assert_ne!(graph.bool(true), graph.bool(false));
    }

    #[test]
    fn test_other_literals_are_not_deduplicated() {
        let mut graph = Graph::new();
        let a = graph.number(2.0);
        let b = graph.number(2.0);
        assert_ne!(a, b);
        let negative_zero = graph.number(-0.0);
        assert_ne!(negative_zero, graph.zero());
    }

    #[test]
    fn test_variable_or_create_is_idempotent() {
        let mut graph = Graph::new();
        assert!(graph.variable("x").is_none());
        let x = graph.variable_or_create("x");
        assert_eq!(graph.variable_or_create("x"), x);
        assert_eq!(graph.var(x).expr(), graph.null());
        assert_eq!(graph.var(x).name(), "x");
    }

    #[test]
    fn test_set_value_bumps_generation() {
        let mut graph = Graph::new();
        let start = graph.generation();
        let two = graph.number(2.0);
        graph.set_value("x", Some(two)).unwrap();
        assert_eq!(graph.generation(), start + 1);
        graph.set_value("x", None).unwrap();
        assert_eq!(graph.generation(), start + 2);
        let x = graph.variable("x").unwrap();
        assert_eq!(graph.var(x).expr(), graph.null());
    }

    #[test]
    fn test_rejected_definition_keeps_generation() {
        let mut graph = Graph::new();
        let self_ref = graph.var_ref("x");
        let before = graph.generation();
        assert!(graph.set_value("x", Some(self_ref)).is_err());
        assert_eq!(graph.generation(), before);
    }

    #[test]
    fn test_register_function_overwrites() {
        let mut graph = Graph::new();
        graph.register_function("f", |_, _| Ok(Value::Number(1.0)));
        graph.register_function("f", |_, _| Ok(Value::Number(2.0)));
        let call = graph.func_call("f", vec![]);
        assert_eq!(graph.latest_value(call).unwrap(), Value::Number(2.0));
    }
}
