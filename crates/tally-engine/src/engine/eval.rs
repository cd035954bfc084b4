//! Lazy, memoized evaluation.
//!
//! Each expression node remembers the generation at which it last computed
//! its value. A read at a newer generation recomputes; otherwise the cached
//! value is returned. Redefining any variable bumps the generation, so the
//! next read anywhere recomputes.
//!
//! Stale nodes are brought up to date in post-order from an explicit work
//! stack, so evaluation depth is bounded by heap, not by the call stack.

use log::trace;

use super::graph::{ExprId, ExprKind, Graph, Memo, VarId};
use super::value::Value;
use crate::error::{GraphError, Result};

impl Graph {
    /// Current value of an expression, recomputing if the memo is stale.
    pub fn latest_value(&self, id: ExprId) -> Result<Value> {
        if let Some(value) = self.fresh_value(id) {
            return Ok(value);
        }

        // (node, children already scheduled)
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if self.fresh_value(current).is_some() {
                continue;
            }
            if expanded {
                let value = self.compute(current)?;
                trace!("recomputed {:?} at generation {}", current, self.generation());
                *self.node(current).memo.borrow_mut() = Memo {
                    generation: self.generation(),
                    value,
                };
                continue;
            }
            stack.push((current, true));
            match self.kind(current) {
                ExprKind::Value(_) => {}
                ExprKind::VarRef(name) => {
                    if let Some(var) = self.variable(name) {
                        stack.push((self.var(var).expr(), false));
                    }
                }
                ExprKind::FuncCall { args, .. } => {
                    stack.extend(args.iter().rev().map(|arg| (*arg, false)));
                }
            }
        }

        Ok(self.fresh_value(id).unwrap_or_default())
    }

    /// Current value of a variable's definition.
    pub fn var_value(&self, id: VarId) -> Result<Value> {
        self.latest_value(self.var(id).expr())
    }

    /// Current value of the variable `name`; NULL if it was never defined.
    pub fn value_of(&self, name: &str) -> Result<Value> {
        match self.variable(name) {
            Some(id) => self.var_value(id),
            None => self.latest_value(self.null()),
        }
    }

    /// The value of `id` if it needs no recomputation at this generation.
    fn fresh_value(&self, id: ExprId) -> Option<Value> {
        let node = self.node(id);
        if let ExprKind::Value(v) = &node.kind {
            return Some(v.clone());
        }
        let memo = node.memo.borrow();
        (memo.generation >= self.generation()).then(|| memo.value.clone())
    }

    /// Value of a child that `latest_value` has already brought up to date.
    fn child_value(&self, id: ExprId) -> Value {
        self.fresh_value(id).unwrap_or_default()
    }

    /// Evaluate one node whose children are all fresh.
    fn compute(&self, id: ExprId) -> Result<Value> {
        match self.kind(id) {
            ExprKind::Value(v) => Ok(v.clone()),
            ExprKind::VarRef(name) => Ok(match self.variable(name) {
                Some(var) => self.child_value(self.var(var).expr()),
                None => Value::Null,
            }),
            ExprKind::FuncCall { name, args } => {
                let values: Vec<Value> = args.iter().map(|arg| self.child_value(*arg)).collect();
                let function = self
                    .function(name)
                    .ok_or_else(|| GraphError::InvalidReference(name.clone()))?;
                function(self, &values).map_err(|source| GraphError::Function {
                    name: name.clone(),
                    source,
                })
            }
        }
    }
}
