use directories::ProjectDirs;
use log::{debug, warn};
use std::path::PathBuf;
use tally_core::Config;

pub(crate) fn default_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("org", "tally", "tally")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("operators.toml");
    Some(path)
}

/// Pick the operator config: an explicit file wins, then the user's default
/// file if present, then the built-in table.
pub(crate) fn resolve_config(
    explicit: Option<&PathBuf>,
    no_default_config: bool,
) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Ok(Config::load(path)?);
    }
    if no_default_config {
        return Ok(Config::default());
    }
    let Some(path) = default_config_path() else {
        return Ok(Config::default());
    };
    if !path.is_file() {
        debug!("no default config at {}", path.display());
        return Ok(Config::default());
    }
    match Config::load(&path) {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!("ignoring default config {}: {}", path.display(), e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_path_is_deterministic() {
        // Should never panic and should either be Some(path) or None.
        let _ = default_config_path();
    }

    #[test]
    fn no_default_config_uses_builtin_table() {
        let config = resolve_config(None, true).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "tally_no_such_operators_{}.toml",
            std::process::id()
        ));
        assert!(resolve_config(Some(&path), false).is_err());
    }
}
