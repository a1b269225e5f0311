//! Prompt weight knob
//!
//! One controllable weight with three input sources: vertical drag, wheel
//! and CC messages. Every mutation returns exactly one `PromptChanged`;
//! nothing is batched or deduplicated.
//!
//! # Usage
//!
//! ```rust,ignore
//! knob.press(y);
//! if let Some(change) = knob.drag_to(new_y) {
//!     session.apply(change);
//! }
//! knob.release();
//! ```

use crate::learn::LearnArbiter;
use crate::midi::CcMessage;
use promptdj_core::config::{DEFAULT_DRAG_SENSITIVITY, DEFAULT_WHEEL_FACTOR};
use promptdj_core::{cc_to_weight, clamp_weight, Prompt, PromptFields};

/// Emitted on every weight or binding change
#[derive(Debug, Clone, PartialEq)]
pub struct PromptChanged {
    pub prompt_id: String,
    pub text: String,
    pub weight: f32,
    pub cc: u8,
    pub color: String,
}

impl PromptChanged {
    /// Registry update carrying text, weight and CC
    pub fn fields(&self) -> PromptFields {
        PromptFields {
            text: Some(self.text.clone()),
            weight: Some(self.weight),
            cc: Some(self.cc),
        }
    }
}

/// Drag reference captured on press
#[derive(Debug, Clone, Copy, PartialEq)]
struct DragOrigin {
    y: f32,
    value: f32,
}

#[derive(Debug, Clone)]
pub struct ParameterKnob {
    prompt: Prompt,
    drag: Option<DragOrigin>,
    /// Weight per pixel of vertical motion
    sensitivity: f32,
    /// Weight per unit of wheel delta
    wheel_factor: f32,
}

impl ParameterKnob {
    pub fn new(prompt: Prompt) -> Self {
        Self::with_sensitivity(prompt, DEFAULT_DRAG_SENSITIVITY, DEFAULT_WHEEL_FACTOR)
    }

    pub fn with_sensitivity(prompt: Prompt, sensitivity: f32, wheel_factor: f32) -> Self {
        Self {
            prompt,
            drag: None,
            sensitivity,
            wheel_factor,
        }
    }

    pub fn prompt_id(&self) -> &str {
        &self.prompt.prompt_id
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn value(&self) -> f32 {
        self.prompt.weight
    }

    pub fn bound_cc(&self) -> u8 {
        self.prompt.cc
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_learning(&self, arbiter: &LearnArbiter) -> bool {
        arbiter.is_learning(&self.prompt.prompt_id)
    }

    /// Replace the prompt (e.g. after a preset load); cancels any drag
    pub fn sync(&mut self, prompt: Prompt) {
        self.prompt = prompt;
        self.drag = None;
    }

    fn changed(&self) -> PromptChanged {
        PromptChanged {
            prompt_id: self.prompt.prompt_id.clone(),
            text: self.prompt.text.clone(),
            weight: self.prompt.weight,
            cc: self.prompt.cc,
            color: self.prompt.color.clone(),
        }
    }

    fn set_value(&mut self, value: f32) -> PromptChanged {
        self.prompt.weight = clamp_weight(value);
        self.changed()
    }

    /// Start a drag at vertical position `y`
    pub fn press(&mut self, y: f32) {
        self.drag = Some(DragOrigin {
            y,
            value: self.prompt.weight,
        });
    }

    /// Pointer moved to `y` (upward motion increases the value)
    ///
    /// The value is derived from the press origin, not the previous move.
    pub fn drag_to(&mut self, y: f32) -> Option<PromptChanged> {
        let origin = self.drag?;
        let delta = origin.y - y;
        Some(self.set_value(origin.value + delta * self.sensitivity))
    }

    /// End the drag
    pub fn release(&mut self) {
        self.drag = None;
    }

    /// End the drag without a release (pointer lost, panel hidden)
    pub fn cancel_drag(&mut self) {
        if self.drag.take().is_some() {
            log::debug!("knob '{}': drag cancelled", self.prompt.prompt_id);
        }
    }

    /// Wheel event; scrolling up (negative `delta_y`) increases the value
    pub fn wheel(&mut self, delta_y: f32) -> PromptChanged {
        let value = self.prompt.weight - delta_y * self.wheel_factor;
        self.set_value(value)
    }

    /// Route a CC message to this knob
    ///
    /// While this knob holds the learn token the first message rebinds it and
    /// leaves the value untouched. Otherwise a message on the bound CC sets
    /// the value to `value / 127 * 2`.
    pub fn handle_cc(
        &mut self,
        message: &CcMessage,
        arbiter: &mut LearnArbiter,
    ) -> Option<PromptChanged> {
        if arbiter.complete(&self.prompt.prompt_id) {
            log::info!(
                "knob '{}': learned CC {} (was {})",
                self.prompt.prompt_id,
                message.cc,
                self.prompt.cc
            );
            self.prompt.cc = message.cc;
            return Some(self.changed());
        }

        if message.cc == self.prompt.cc {
            return Some(self.set_value(cc_to_weight(message.value)));
        }
        None
    }
}
