use std::collections::HashMap;
use std::path::PathBuf;
use tally_engine::builtins::register_builtins;
use tally_engine::engine::{ExprId, Graph};
use tally_engine::precedence::OperatorTable;

use crate::config::Config;

/// Maximum number of undo entries to keep
pub(crate) const MAX_UNDO_STACK: usize = 100;

/// Represents an undoable rebinding of a single variable
#[derive(Clone, Debug)]
pub struct UndoAction {
    pub name: String,
    pub old_expr: ExprId,
    pub new_expr: ExprId,
    pub old_source: Option<String>,
    pub new_source: Option<String>,
}

/// Represents an undo entry (single action or batch from a file load)
#[derive(Clone, Debug)]
pub enum UndoEntry {
    /// A single definition
    Single(UndoAction),
    /// A batch of definitions applied together
    Batch(Vec<UndoAction>),
}

/// UI-agnostic document state: one expression graph plus the operator
/// table used to read formulas into it.
pub struct Document {
    /// Expressions, variables and functions
    pub graph: Graph,
    /// Operator table for the formula front end
    pub operators: OperatorTable,
    /// Last definitions file loaded
    pub file_path: Option<PathBuf>,
    /// Whether any definition changed since the last load
    pub modified: bool,
    /// Formula text each variable was last defined with
    pub sources: HashMap<String, String>,
    /// Undo stack
    pub undo_stack: Vec<UndoEntry>,
    /// Redo stack
    pub redo_stack: Vec<UndoEntry>,
}

impl Document {
    /// Create a document with the default operator table and all built-ins.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut graph = Graph::new();
        register_builtins(&mut graph);
        Document {
            graph,
            operators: config.operators,
            file_path: None,
            modified: false,
            sources: HashMap::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// The expression a variable is currently bound to (NULL if undefined).
    pub(crate) fn current_expr(&self, name: &str) -> ExprId {
        self.graph
            .variable(name)
            .map(|id| self.graph.var(id).expr())
            .unwrap_or_else(|| self.graph.null())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
