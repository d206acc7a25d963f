//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable consulted for the root folder
pub const ROOT_FOLDER_ENV: &str = "RAESONIC_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "raesonic.db";

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file (`root_folder` key)
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(cli_arg: Option<&Path>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        debug!("Root folder from command line: {}", path.display());
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            debug!("Root folder from {}: {}", env_var_name, path);
            return PathBuf::from(path);
        }
    }

    if let Ok(config_path) = config_file_path() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Some(root) = root_folder_from_toml(&content) {
                debug!("Root folder from {}: {}", config_path.display(), root.display());
                return root;
            }
        }
    }

    let fallback = default_root_folder();
    info!("No root folder configured, using default: {}", fallback.display());
    fallback
}

/// Extract `root_folder` from TOML config content
///
/// Malformed TOML or a missing key yields `None` so startup can fall through
/// to the next resolution tier.
pub fn root_folder_from_toml(content: &str) -> Option<PathBuf> {
    let config = toml::from_str::<toml::Value>(content).ok()?;
    config
        .get("root_folder")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Path of the database file for a root folder
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join(DATABASE_FILE_NAME)
}

/// Get configuration file path for the platform
fn config_file_path() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // ~/.config/raesonic/config.toml first, then /etc/raesonic/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("raesonic").join("config.toml"));
        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        let system_config = PathBuf::from("/etc/raesonic/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let path = dirs::config_dir()
        .map(|d| d.join("raesonic").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default root folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("raesonic"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\raesonic"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("raesonic"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/raesonic"))
    } else {
        dirs::data_local_dir()
            .map(|d| d.join("raesonic"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/raesonic"))
    }
}
