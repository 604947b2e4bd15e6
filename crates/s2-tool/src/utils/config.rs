//! Tool configuration stored in config.toml next to the executable.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Folders or `.vpk` files searched by every command, before discovered roots.
    pub search_roots: Vec<Utf8PathBuf>,
    /// Platform the `shader` command expects; a different pick is flagged.
    pub default_platform: Option<String>,
}

impl AppConfig {
    /// Add a root unless it is already present. Returns whether it was added.
    pub fn add_root(&mut self, root: Utf8PathBuf) -> bool {
        if self.search_roots.contains(&root) {
            return false;
        }
        self.search_roots.push(root);
        true
    }
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns the default configuration file path (config.toml).
pub fn default_config_path() -> Option<Utf8PathBuf> {
    install_dir().map(|dir| dir.join("config.toml"))
}

/// Loads the configuration from `path`.
/// Returns the default configuration if the file doesn't exist or cannot be parsed.
pub fn load_config_from(path: &camino::Utf8Path) -> AppConfig {
    let Ok(content) = fs::read_to_string(path) else {
        return AppConfig::default();
    };
    match toml::from_str(&content) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!("Ignoring invalid config {}: {}", path, e);
            AppConfig::default()
        }
    }
}

pub fn load_config() -> AppConfig {
    default_config_path()
        .map(|path| load_config_from(&path))
        .unwrap_or_default()
}

pub fn save_config_to(path: &camino::Utf8Path, cfg: &AppConfig) -> io::Result<()> {
    let content = toml::to_string_pretty(cfg).map_err(io::Error::other)?;
    fs::write(path, content)
}

pub fn save_config(cfg: &AppConfig) -> io::Result<()> {
    match default_config_path() {
        Some(path) => save_config_to(&path, cfg),
        None => Err(io::Error::new(
            io::ErrorKind::NotFound,
            "Could not determine config path",
        )),
    }
}
