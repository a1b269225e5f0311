//! Host configuration schema
//!
//! Stored as YAML at `default_config_path()`. Every field has a default so a
//! partial file is valid.

use super::paths::default_storage_dir;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default weight change per pixel of vertical drag (200 px spans the range)
pub const DEFAULT_DRAG_SENSITIVITY: f32 = 0.01;

/// Default weight change per unit of wheel delta
pub const DEFAULT_WHEEL_FACTOR: f32 = 0.0025;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptDjConfig {
    /// Directory for the file-backed key-value store
    pub storage_dir: PathBuf,
    /// Visual feedback throttle interval in milliseconds
    pub feedback_interval_ms: u64,
    /// Weight per pixel of vertical drag
    pub drag_sensitivity: f32,
    /// Weight per unit of wheel delta
    pub wheel_factor: f32,
    /// Client name registered with the platform MIDI layer
    pub midi_client_name: String,
    /// Activate the first device on the first enumeration
    pub auto_select_first_device: bool,
    /// Preset to activate at startup (first default when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_preset: Option<String>,
}

impl Default for PromptDjConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            feedback_interval_ms: 30,
            drag_sensitivity: DEFAULT_DRAG_SENSITIVITY,
            wheel_factor: DEFAULT_WHEEL_FACTOR,
            midi_client_name: "promptdj".to_string(),
            auto_select_first_device: true,
            initial_preset: None,
        }
    }
}

impl PromptDjConfig {
    pub fn feedback_interval(&self) -> Duration {
        Duration::from_millis(self.feedback_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
feedback_interval_ms: 50
initial_preset: "Club Night"
"#;
        let config: PromptDjConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.feedback_interval(), Duration::from_millis(50));
        assert_eq!(config.initial_preset.as_deref(), Some("Club Night"));
        assert_eq!(config.drag_sensitivity, DEFAULT_DRAG_SENSITIVITY);
        assert!(config.auto_select_first_device);
    }
}
