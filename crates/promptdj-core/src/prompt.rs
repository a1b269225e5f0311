//! Prompt data model
//!
//! A prompt is one text-described musical ingredient with a weight in
//! `[MIN_WEIGHT, MAX_WEIGHT]`, a display colour and the CC number of the
//! knob that drives it.

use serde::{Deserialize, Serialize};

/// Lowest prompt weight
pub const MIN_WEIGHT: f32 = 0.0;

/// Highest prompt weight
pub const MAX_WEIGHT: f32 = 2.0;

/// Highest 7-bit MIDI data value
pub const MIDI_MAX: u8 = 127;

/// Clamp a weight into `[MIN_WEIGHT, MAX_WEIGHT]`
///
/// NaN collapses to `MIN_WEIGHT` so a bad input can never escape the domain.
pub fn clamp_weight(weight: f32) -> f32 {
    if weight.is_nan() {
        return MIN_WEIGHT;
    }
    weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
}

/// Rescale a 7-bit CC value (0-127) linearly onto the weight range
///
/// `0 → 0.0`, `127 → 2.0`.
pub fn cc_to_weight(value: u8) -> f32 {
    let value = value.min(MIDI_MAX) as f32;
    value / MIDI_MAX as f32 * MAX_WEIGHT
}

/// A single weighted prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Opaque id, stable for the lifetime of the registry
    pub prompt_id: String,
    /// Text sent to the generation engine
    pub text: String,
    /// Weight in `[0, 2]`
    pub weight: f32,
    /// Colour token (e.g. `#9900ff`)
    pub color: String,
    /// Bound CC number (0-127)
    pub cc: u8,
}

impl Prompt {
    /// Create a prompt, clamping weight and CC into range
    pub fn new(
        prompt_id: impl Into<String>,
        text: impl Into<String>,
        weight: f32,
        color: impl Into<String>,
        cc: u8,
    ) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            text: text.into(),
            weight: clamp_weight(weight),
            color: color.into(),
            cc: cc.min(MIDI_MAX),
        }
    }
}

/// Partial update applied to an existing prompt
///
/// `prompt_id` and `color` are never changed by an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptFields {
    pub text: Option<String>,
    pub weight: Option<f32>,
    pub cc: Option<u8>,
}

impl PromptFields {
    /// Update only the weight
    pub fn weight(weight: f32) -> Self {
        Self {
            weight: Some(weight),
            ..Self::default()
        }
    }

    /// Merge these fields into `prompt`
    pub fn apply_to(&self, prompt: &mut Prompt) {
        if let Some(ref text) = self.text {
            prompt.text = text.clone();
        }
        if let Some(weight) = self.weight {
            prompt.weight = clamp_weight(weight);
        }
        if let Some(cc) = self.cc {
            prompt.cc = cc.min(MIDI_MAX);
        }
    }
}
