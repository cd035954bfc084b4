//! Line-oriented interactive session.
//!
//! Each line is a statement (`name = formula`, `name =`, or a formula) or a
//! `:` command.

use std::io::{BufRead, Write};
use std::path::Path;
use tally_core::{Document, Outcome, Result, Value};
use tally_engine::builtins::BUILTINS;

const HELP: &str = "\
Statements:
  name = formula   define or redefine a variable
  name =           reset a variable to null
  formula          evaluate and print
Commands:
  :vars            list variables with their values
  :functions       list built-in functions
  :load <file>     load a definitions file
  :undo / :redo    step through definition history
  :help            show this help
  :quit            exit";

/// Format a result for display; errors render as `#ERR <message>`.
pub(crate) fn display_result<E: std::fmt::Display>(
    result: &std::result::Result<Value, E>,
) -> String {
    match result {
        Ok(value) => value.to_string(),
        Err(e) => format!("#ERR {}", e),
    }
}

/// Render what a statement did, reading back defined values.
pub(crate) fn describe_outcome(doc: &Document, outcome: &Outcome) -> String {
    match outcome {
        Outcome::Defined(name) => format!("{} = {}", name, display_result(&doc.value_of(name))),
        Outcome::Cleared(name) => format!("{} cleared", name),
        Outcome::Evaluated(value) => value.to_string(),
    }
}

fn command(doc: &mut Document, cmd: &str, out: &mut impl Write) -> Result<bool> {
    let (name, arg) = match cmd.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (cmd, ""),
    };
    match name {
        "q" | "quit" => return Ok(false),
        "h" | "help" => writeln!(out, "{}", HELP)?,
        "vars" => {
            for var in doc.variables() {
                let source = var.source.as_deref().unwrap_or("null");
                writeln!(out, "{} = {}  -> {}", var.name, source, display_result(&var.value))?;
            }
        }
        "functions" => {
            for builtin in BUILTINS {
                writeln!(out, "{:<8} {}", builtin.name, builtin.description)?;
            }
        }
        "load" => {
            let count = doc.load_file(Path::new(arg))?;
            writeln!(out, "loaded {} definitions", count)?;
        }
        "undo" => writeln!(out, "undid {}", doc.undo()?.join(", "))?,
        "redo" => writeln!(out, "redid {}", doc.redo()?.join(", "))?,
        _ => writeln!(out, "#ERR Unknown command: :{}", name)?,
    }
    Ok(true)
}

/// Run until end of input or `:quit`. Errors are printed, never fatal.
pub(crate) fn run(doc: &mut Document, input: impl BufRead, mut out: impl Write) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let result = match line.strip_prefix(':') {
            Some(cmd) => command(doc, cmd, &mut out),
            None => doc.execute(line).and_then(|outcome| {
                writeln!(out, "{}", describe_outcome(doc, &outcome))?;
                Ok(true)
            }),
        };

        match result {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => writeln!(out, "#ERR {}", e)?,
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(input: &str) -> String {
        let mut doc = Document::new();
        let mut out = Vec::new();
        run(&mut doc, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_definitions_and_queries() {
        let out = session("x = 3\ny = 5\nz = x + y\nz * 2\n");
        assert_eq!(out, "x = 3\ny = 5\nz = 8\n16\n");
    }

    #[test]
    fn test_cycle_reported_and_session_continues() {
        let out = session("x = 3\nz = x + 1\nx = z\nx\n");
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[2].starts_with("#ERR Circular reference"));
        assert_eq!(lines[3], "3");
    }

    #[test]
    fn test_undo_and_quit() {
        let out = session("a = 1\na = 2\n:undo\na\n:quit\na = 9\n");
        assert_eq!(out, "a = 1\na = 2\nundid a\n1\n");
    }

    #[test]
    fn test_vars_listing() {
        let out = session("a = 2\nb = a / 0\n:vars\n");
        assert!(out.contains("a = 2  -> 2"));
        assert!(out.contains("b = a / 0  -> #ERR"));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(session(":bogus\n"), "#ERR Unknown command: :bogus\n");
    }
}
