//! Standard locations for PromptDJ files

use std::path::PathBuf;

/// `<config dir>/promptdj` (falls back to `./promptdj`)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptdj")
}

/// `<config dir>/promptdj/config.yaml`
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

/// `<config dir>/promptdj/storage`
pub fn default_storage_dir() -> PathBuf {
    default_config_dir().join("storage")
}
