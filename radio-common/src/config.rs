//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Optional settings read from `config.toml`
///
/// Every field is optional; command-line arguments and environment
/// variables take priority over anything set here.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    /// Modulus for published start references
    pub modulus: Option<u64>,
    pub background_interval_secs: Option<u64>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str::<TomlConfig>(&content)?;
        Ok(config)
    }

    /// Load the platform config file if one exists.
    ///
    /// A missing or malformed file is not fatal: a warning is logged and
    /// defaults are returned.
    pub fn load_or_default() -> Self {
        match find_config_file() {
            Ok(path) => match Self::load(&path) {
                Ok(config) => {
                    debug!("Loaded config file {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring config file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                debug!("No config file: {}", e);
                Self::default()
            }
        }
    }
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml: Option<&TomlConfig>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(root_folder) = toml.and_then(|c| c.root_folder.as_ref()) {
        return root_folder.clone();
    }

    default_root_folder()
}

/// Locate the platform config file
fn find_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/radio/config.toml first, then /etc/radio/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("radio").join("config.toml"));
        let system_config = PathBuf::from("/etc/radio/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("radio").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("radio"))
        .unwrap_or_else(|| PathBuf::from("./radio_data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    const TEST_ENV: &str = "RADIO_TEST_ROOT_FOLDER";

    #[test]
    #[serial]
    fn test_cli_argument_wins() {
        env::set_var(TEST_ENV, "/from/env");
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), TEST_ENV, Some(&toml));
        assert_eq!(resolved, PathBuf::from("/from/cli"));
        env::remove_var(TEST_ENV);
    }

    #[test]
    #[serial]
    fn test_env_beats_toml() {
        env::set_var(TEST_ENV, "/from/env");
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        assert_eq!(
            resolve_root_folder(None, TEST_ENV, Some(&toml)),
            PathBuf::from("/from/env")
        );
        env::remove_var(TEST_ENV);
    }

    #[test]
    #[serial]
    fn test_toml_then_default() {
        env::remove_var(TEST_ENV);
        let toml = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        assert_eq!(
            resolve_root_folder(None, TEST_ENV, Some(&toml)),
            PathBuf::from("/from/toml")
        );
        assert_eq!(resolve_root_folder(None, TEST_ENV, None), default_root_folder());
    }

    #[test]
    fn test_load_toml_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "root_folder = \"/srv/radio\"\nport = 8080\nmodulus = 5000\n",
        )
        .unwrap();

        let config = TomlConfig::load(&path).unwrap();
        assert_eq!(config.root_folder, Some(PathBuf::from("/srv/radio")));
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.modulus, Some(5000));
        assert_eq!(config.background_interval_secs, None);
    }

    #[test]
    fn test_load_malformed_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a number").unwrap();
        assert!(matches!(TomlConfig::load(&path), Err(Error::Toml(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            TomlConfig::load(&dir.path().join("absent.toml")),
            Err(Error::Io(_))
        ));
    }
}
