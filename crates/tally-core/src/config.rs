//! Operator table configuration.
//!
//! A config file is TOML. Entries under `[operators]` are merged over the
//! default table unless `replace_default_operators = true`:
//!
//! ```toml
//! [operators."+"]
//! binding_power = 10
//! associativity = "left"
//! prefix_binding_power = 100
//! ```

use log::debug;
use serde::Deserialize;
use std::path::Path;
use tally_engine::precedence::{OperatorSpec, OperatorTable};

use crate::error::Result;

/// Largest config file we are willing to read.
const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub operators: OperatorTable,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    replace_default_operators: bool,
    #[serde(default)]
    operators: OperatorTable,
}

/// The table used when no config overrides it.
pub fn default_operators() -> OperatorTable {
    OperatorTable::new()
        .with("|", OperatorSpec::left(3))
        .with("&", OperatorSpec::left(4))
        .with("==", OperatorSpec::left(6))
        .with("<", OperatorSpec::left(6))
        .with(">", OperatorSpec::left(6))
        .with("+", OperatorSpec::left(10).with_prefix(100))
        .with("-", OperatorSpec::left(10).with_prefix(100))
        .with("*", OperatorSpec::left(30))
        .with("/", OperatorSpec::left(30))
        .with("%", OperatorSpec::left(30))
        .with("^", OperatorSpec::right(40))
        .with("!", OperatorSpec::left(0).with_prefix(100))
}

impl Default for Config {
    fn default() -> Self {
        Config {
            operators: default_operators(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Config> {
        let raw: RawConfig = toml::from_str(content)?;
        let mut operators = if raw.replace_default_operators {
            OperatorTable::new()
        } else {
            default_operators()
        };
        operators.merge(raw.operators);
        Ok(Config { operators })
    }

    pub fn load(path: &Path) -> Result<Config> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > MAX_CONFIG_FILE_BYTES {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "Refusing to read {}: config file too large ({} bytes, max {})",
                    path.display(),
                    meta.len(),
                    MAX_CONFIG_FILE_BYTES
                ),
            )
            .into());
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(
            "loaded {} operators from {}",
            config.operators.len(),
            path.display()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;
    use tally_engine::precedence::Associativity;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_merge_over_defaults() {
        let config = Config::from_toml_str(
            r#"
[operators."^"]
binding_power = 40

[operators."=>"]
binding_power = 2
associativity = "right"
"#,
        )
        .unwrap();
        let pow = config.operators.get("^").unwrap();
        assert_eq!(pow.associativity, Associativity::Left);
        let arrow = config.operators.get("=>").unwrap();
        assert_eq!(arrow.associativity, Associativity::Right);
        assert_eq!(arrow.prefix_binding_power, None);
        assert!(config.operators.get("+").is_some());
    }

    #[test]
    fn test_replace_defaults() {
        let config = Config::from_toml_str(
            r#"
replace_default_operators = true

[operators."+"]
binding_power = 1
associativity = "none"
prefix_binding_power = 9
"#,
        )
        .unwrap();
        assert_eq!(config.operators.len(), 1);
        assert_eq!(
            config.operators.get("+").copied(),
            Some(OperatorSpec::non_associative(1).with_prefix(9))
        );
    }

    #[test]
    fn test_bad_config_is_reported() {
        assert!(matches!(
            Config::from_toml_str("[operators.\"+\"]\nbinding_power = -1"),
            Err(TallyError::Config(_))
        ));
        assert!(matches!(
            Config::from_toml_str("colour = \"blue\""),
            Err(TallyError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join(format!(
            "tally_missing_config_{}.toml",
            std::process::id()
        ));
        assert!(matches!(Config::load(&path), Err(TallyError::Io(_))));
    }
}
