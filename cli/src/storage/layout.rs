//! Storage layout configuration

use std::path::PathBuf;

use crate::filesys::file::File;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "MM_CONFIG_DIR";

/// Where the client keeps its own files
#[derive(Debug, Clone)]
pub struct StorageLayout {
    /// Base directory for all client storage
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the settings file path
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }
}

impl Default for StorageLayout {
    fn default() -> Self {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Self::new(dir);
        }

        let base_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mavensmate");

        Self::new(base_dir)
    }
}
