//! Prompt state for PromptDJ
//!
//! This crate provides:
//! - The prompt registry the generation engine consumes
//! - Default and user presets with durable storage
//! - Weight → visual feedback mapping and its throttle
//! - Typed events fanned out over flume channels
//!
//! # Data flow
//!
//! ```text
//! knob change → PromptRegistry::apply_change → Event::RegistryChanged → engine / FeedbackFrame
//! PresetStore::switch_to ──────→ PromptRegistry::load ──↗
//! ```

pub mod config;
pub mod defaults;
mod events;
mod feedback;
mod filtered;
mod preset;
mod prompt;
mod registry;
mod storage;
mod throttle;

pub use events::{Event, EventBus};
pub use feedback::{
    halo, FeedbackFrame, GradientStop, Halo, PromptFeedback, FILTERED_OPACITY,
    HALO_LEVEL_MODIFIER, MAX_ALPHA, MAX_HALO_SCALE, MAX_WEIGHT_FOR_FULL_OPACITY, MIN_HALO_SCALE,
};
pub use filtered::FilteredPromptSet;
pub use preset::{
    deserialize_presets, serialize_presets, Overwrite, Preset, PresetClass, PresetError,
    PresetStore, USER_PRESETS_KEY,
};
pub use prompt::{cc_to_weight, clamp_weight, Prompt, PromptFields, MAX_WEIGHT, MIDI_MAX, MIN_WEIGHT};
pub use registry::{PromptRegistry, RegistryError};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use throttle::{Throttle, DEFAULT_FEEDBACK_INTERVAL};
