//! Configuration for PromptDJ hosts
//!
//! - Generic YAML config loading/saving
//! - Standard file locations
//! - The host settings schema

mod io;
mod paths;
mod settings;

pub use io::{load_config, save_config};
pub use paths::{default_config_dir, default_config_path, default_storage_dir};
pub use settings::{PromptDjConfig, DEFAULT_DRAG_SENSITIVITY, DEFAULT_WHEEL_FACTOR};
