//! Expression graph API.
//!
//! This module provides the data model and evaluation engine:
//!
//! - [`Value`] - Tagged literal values (null, bool, number, string)
//! - [`Units`], [`UnitsId`] - Interned numerator/denominator unit sets
//! - [`Graph`], [`ExprId`], [`ExprKind`], [`Var`], [`VarId`] - Arena-owned expressions and variables
//! - [`Graph::set_value`] - Rebind a variable, rejecting circular references
//! - [`Graph::latest_value`] - Lazy evaluation memoized per generation
//! - [`render_expr`], [`format_number`] - Debug rendering and display helpers

mod cycle;
mod eval;
mod format;
mod graph;
mod units;
mod value;

pub use format::{format_number, render_expr};
pub use graph::{ExprId, ExprKind, Graph, NativeFn, Var, VarId};
pub use units::{Units, UnitsId, UnitsRegistry};
pub use value::Value;
