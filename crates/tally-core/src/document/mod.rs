mod io;
mod ops;
mod state;

pub use ops::{Outcome, VariableSummary};
pub use state::{Document, UndoAction, UndoEntry};
