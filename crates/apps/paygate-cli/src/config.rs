//! Configuration file location and loading.

use paygate_client::GatewayConfig;
use std::path::{Path, PathBuf};

use crate::error::{CliError, CliResult};

/// Get the default configuration file path: `~/.paygate/config.toml`.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".paygate")
        .join("config.toml")
}

/// Load and validate the gateway configuration at `path`.
pub fn load_config(path: &Path) -> CliResult<GatewayConfig> {
    if !path.exists() {
        return Err(CliError::config(format!(
            "no configuration at {}",
            path.display()
        )));
    }
    let config = GatewayConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_config_path();
        assert!(path.ends_with(".paygate/config.toml"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = load_config(&temp_dir.path().join("config.toml")).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_load_validates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "app_id = \"wx1\"\nmch_id = \"100\"\n").unwrap();
        assert!(load_config(&path).is_err());

        std::fs::write(&path, "app_id = \"wx1\"\nmch_id = \"100\"\nkey = \"k\"\n").unwrap();
        assert_eq!(load_config(&path).unwrap().app_id, "wx1");
    }
}
