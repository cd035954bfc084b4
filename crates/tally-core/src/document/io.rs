use log::{info, warn};
use std::path::Path;

use super::Document;
use crate::error::{Result, TallyError};
use crate::syntax::{Statement, parse_statement};

const MAX_DEFINITIONS_FILE_BYTES: u64 = 1_048_576; // 1 MiB

fn read_definitions_file(path: &Path) -> Result<String> {
    let meta = std::fs::metadata(path)?;
    if meta.len() > MAX_DEFINITIONS_FILE_BYTES {
        return Err(TallyError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "Refusing to read {}: definitions file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_DEFINITIONS_FILE_BYTES
            ),
        )));
    }
    Ok(std::fs::read_to_string(path)?)
}

impl Document {
    /// Create a document and load a definitions file if provided.
    pub fn with_file(path: Option<&Path>) -> Result<Self> {
        let mut doc = Self::new();
        if let Some(p) = path {
            doc.load_file(p)?;
        }
        Ok(doc)
    }

    /// Load `name = formula` lines from a file. See [`Document::load_str`].
    ///
    /// Unsaved edits made before the load keep the document modified.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = read_definitions_file(path)?;
        let was_modified = self.modified;
        let count = self.load_str(&content)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = was_modified;
        info!("loaded {} definitions from {}", count, path.display());
        Ok(count)
    }

    /// Apply definitions, one per line. Blank lines and `#` comments are
    /// skipped. Either every line applies or none does; the whole load is a
    /// single undo step. Returns the number of definitions applied.
    pub fn load_str(&mut self, content: &str) -> Result<usize> {
        let was_modified = self.modified;
        let mut applied = Vec::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let result = match parse_statement(line) {
                Statement::Define { name, formula } => self.bind_for_batch(name, Some(formula)),
                Statement::Clear { name } => self.bind_for_batch(name, None),
                Statement::Evaluate(_) => Err(TallyError::Syntax(
                    "Expected 'name = formula' format".to_string(),
                )),
            };

            match result {
                Ok(action) => applied.push(action),
                Err(e) => {
                    warn!("definitions rejected at line {}: {}", line_num + 1, e);
                    self.revert(&applied)?;
                    self.modified = was_modified;
                    return Err(TallyError::Parse {
                        line: line_num + 1,
                        message: e.to_string(),
                    });
                }
            }
        }

        let count = applied.len();
        self.push_undo_batch(applied);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_engine::engine::Value;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "tally_{}_{}_{:?}.tly",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
        ))
    }

    #[test]
    fn test_load_str() {
        let mut doc = Document::new();
        let count = doc
            .load_str(
                r#"
# prices
price = 12.5
qty = 4
total = price * qty
label = "Total: " + total
"#,
            )
            .unwrap();
        assert_eq!(count, 4);
        assert_eq!(doc.value_of("total").unwrap(), Value::Number(50.0));
        assert_eq!(doc.value_of("label").unwrap(), Value::from("Total: 50"));
        assert_eq!(doc.undo_stack.len(), 1);
    }

    #[test]
    fn test_load_failure_is_transactional() {
        let mut doc = Document::new();
        doc.define("a", "1").unwrap();

        let err = doc
            .load_str("a = 2\nb = a + 1\nc = (1 +\n")
            .unwrap_err();
        match err {
            TallyError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("Expected parse error, got {other:?}"),
        }
        assert_eq!(doc.value_of("a").unwrap(), Value::Number(1.0));
        assert_eq!(doc.value_of("b").unwrap(), Value::Null);
        assert_eq!(doc.sources.get("a").map(String::as_str), Some("1"));
        assert_eq!(doc.undo_stack.len(), 1);
    }

    #[test]
    fn test_load_rejects_cycles_with_line() {
        let mut doc = Document::new();
        let err = doc.load_str("x = y\ny = x").unwrap_err();
        assert!(matches!(err, TallyError::Parse { line: 2, .. }));
        assert_eq!(doc.value_of("x").unwrap(), Value::Null);
        assert!(!doc.modified);
    }

    #[test]
    fn test_bare_formula_line_is_rejected() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.load_str("1 + 2"),
            Err(TallyError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_batch_undo() {
        let mut doc = Document::new();
        doc.load_str("a = 1\nb = a + 1").unwrap();
        doc.undo().unwrap();
        assert_eq!(doc.value_of("a").unwrap(), Value::Null);
        assert_eq!(doc.value_of("b").unwrap(), Value::Null);
    }

    #[test]
    fn test_load_file() {
        let path = temp_path("defs");
        std::fs::write(&path, "r = 2\narea = 3 * r ^ 2\n").unwrap();

        let doc = Document::with_file(Some(&path)).unwrap();
        assert_eq!(doc.value_of("area").unwrap(), Value::Number(12.0));
        assert_eq!(doc.file_path.as_deref(), Some(path.as_path()));
        assert!(!doc.modified);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_file_keeps_earlier_edits_modified() {
        let path = temp_path("edits");
        std::fs::write(&path, "r = 2\n").unwrap();

        let mut doc = Document::new();
        doc.define("scratch", "1").unwrap();
        assert!(doc.modified);
        doc.load_file(&path).unwrap();
        assert!(doc.modified);
        assert_eq!(doc.value_of("r").unwrap(), Value::Number(2.0));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file() {
        let mut doc = Document::new();
        assert!(matches!(
            doc.load_file(&temp_path("missing")),
            Err(TallyError::Io(_))
        ));
    }
}
