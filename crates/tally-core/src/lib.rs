//! tally-core - UI-agnostic document model, formula front end and configuration.

pub mod config;
pub mod document;
pub mod error;
pub mod syntax;

pub use config::Config;
pub use document::{Document, Outcome, UndoAction};
pub use error::{Result, TallyError};

pub use tally_engine::engine::Value;
