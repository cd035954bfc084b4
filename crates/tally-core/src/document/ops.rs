use log::debug;
use tally_engine::GraphError;
use tally_engine::engine::{ExprId, Value, VarId};

use super::{Document, UndoAction, UndoEntry};
use crate::error::{Result, TallyError};
use crate::syntax::{Statement, is_identifier, parse_formula, parse_statement};

/// What running a statement did.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Defined(String),
    Cleared(String),
    Evaluated(Value),
}

/// One row of [`Document::variables`].
#[derive(Clone, Debug, PartialEq)]
pub struct VariableSummary {
    pub name: String,
    pub source: Option<String>,
    pub value: std::result::Result<Value, GraphError>,
}

impl Document {
    fn check_name(name: &str) -> Result<()> {
        if is_identifier(name) {
            Ok(())
        } else {
            Err(TallyError::Syntax(format!("Invalid variable name: {}", name)))
        }
    }

    /// Rebind `name` without touching the undo history.
    fn bind(&mut self, name: &str, expr: ExprId, source: Option<String>) -> Result<UndoAction> {
        let old_expr = self.current_expr(name);
        self.graph.set_value(name, Some(expr))?;
        let old_source = match &source {
            Some(s) => self.sources.insert(name.to_string(), s.clone()),
            None => self.sources.remove(name),
        };
        self.modified = true;
        Ok(UndoAction {
            name: name.to_string(),
            old_expr,
            new_expr: expr,
            old_source,
            new_source: source,
        })
    }

    fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push(entry);
        self.redo_stack.clear();
        if self.undo_stack.len() > super::state::MAX_UNDO_STACK {
            self.undo_stack.remove(0);
        }
    }

    /// Define `name` from formula text.
    pub fn define(&mut self, name: &str, formula: &str) -> Result<VarId> {
        Self::check_name(name)?;
        let expr = parse_formula(&mut self.graph, &self.operators, formula)?;
        let action = self.bind(name, expr, Some(formula.trim().to_string()))?;
        debug!("defined {} = {}", name, formula.trim());
        self.push_undo(UndoEntry::Single(action));
        self.var_id(name)
    }

    /// Reset `name` to NULL.
    pub fn clear(&mut self, name: &str) -> Result<VarId> {
        Self::check_name(name)?;
        let null = self.graph.null();
        let action = self.bind(name, null, None)?;
        self.push_undo(UndoEntry::Single(action));
        self.var_id(name)
    }

    fn var_id(&self, name: &str) -> Result<VarId> {
        self.graph
            .variable(name)
            .ok_or_else(|| TallyError::Syntax(format!("Unknown variable: {}", name)))
    }

    /// Evaluate formula text against the current definitions.
    pub fn evaluate(&mut self, formula: &str) -> Result<Value> {
        let expr = parse_formula(&mut self.graph, &self.operators, formula)?;
        Ok(self.graph.latest_value(expr)?)
    }

    /// Current value of a variable (NULL if never defined).
    pub fn value_of(&self, name: &str) -> Result<Value> {
        Ok(self.graph.value_of(name)?)
    }

    /// Run one statement line.
    pub fn execute(&mut self, line: &str) -> Result<Outcome> {
        match parse_statement(line) {
            Statement::Define { name, formula } => {
                self.define(name, formula)?;
                Ok(Outcome::Defined(name.to_string()))
            }
            Statement::Clear { name } => {
                self.clear(name)?;
                Ok(Outcome::Cleared(name.to_string()))
            }
            Statement::Evaluate(formula) => Ok(Outcome::Evaluated(self.evaluate(formula)?)),
        }
    }

    /// Every variable in creation order with its source and current value.
    pub fn variables(&self) -> Vec<VariableSummary> {
        self.graph
            .variables()
            .map(|(id, var)| VariableSummary {
                name: var.name().to_string(),
                source: self.sources.get(var.name()).cloned(),
                value: self.graph.var_value(id),
            })
            .collect()
    }

    fn restore(&mut self, name: &str, expr: ExprId, source: Option<String>) -> Result<()> {
        self.graph.set_value(name, Some(expr))?;
        match source {
            Some(s) => {
                self.sources.insert(name.to_string(), s);
            }
            None => {
                self.sources.remove(name);
            }
        }
        self.modified = true;
        Ok(())
    }

    /// Roll back actions newest-first.
    pub(crate) fn revert(&mut self, actions: &[UndoAction]) -> Result<()> {
        for action in actions.iter().rev() {
            self.restore(&action.name, action.old_expr, action.old_source.clone())?;
        }
        Ok(())
    }

    fn reapply(&mut self, actions: &[UndoAction]) -> Result<()> {
        for action in actions {
            self.restore(&action.name, action.new_expr, action.new_source.clone())?;
        }
        Ok(())
    }

    /// Undo the last definition (or batch). Returns the affected names.
    pub fn undo(&mut self) -> Result<Vec<String>> {
        let entry = self.undo_stack.pop().ok_or(TallyError::NothingToUndo)?;
        let actions = match &entry {
            UndoEntry::Single(action) => std::slice::from_ref(action),
            UndoEntry::Batch(actions) => actions.as_slice(),
        };
        let names = actions.iter().map(|a| a.name.clone()).collect();
        self.revert(actions)?;
        self.redo_stack.push(entry);
        Ok(names)
    }

    /// Redo the last undone definition (or batch). Returns the affected names.
    pub fn redo(&mut self) -> Result<Vec<String>> {
        let entry = self.redo_stack.pop().ok_or(TallyError::NothingToRedo)?;
        let actions = match &entry {
            UndoEntry::Single(action) => std::slice::from_ref(action),
            UndoEntry::Batch(actions) => actions.as_slice(),
        };
        let names = actions.iter().map(|a| a.name.clone()).collect();
        self.reapply(actions)?;
        self.undo_stack.push(entry);
        Ok(names)
    }

    pub(crate) fn bind_for_batch(
        &mut self,
        name: &str,
        formula: Option<&str>,
    ) -> Result<UndoAction> {
        Self::check_name(name)?;
        match formula {
            Some(formula) => {
                let expr = parse_formula(&mut self.graph, &self.operators, formula)?;
                self.bind(name, expr, Some(formula.trim().to_string()))
            }
            None => {
                let null = self.graph.null();
                self.bind(name, null, None)
            }
        }
    }

    pub(crate) fn push_undo_batch(&mut self, actions: Vec<UndoAction>) {
        if actions.is_empty() {
            return;
        }
        self.push_undo(UndoEntry::Batch(actions));
    }
}
