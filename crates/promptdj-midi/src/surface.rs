//! Control surface: one knob per registry prompt plus the learn arbiter
//!
//! CC numbers need not be unique. When several knobs share one, only the
//! most recently bound knob follows it; registry order counts as binding
//! order after a load, and a completed learn makes that knob the newest.

use crate::knob::{ParameterKnob, PromptChanged};
use crate::learn::LearnArbiter;
use crate::midi::CcMessage;
use promptdj_core::PromptRegistry;

#[derive(Debug, Clone)]
pub struct ControlSurface {
    knobs: Vec<ParameterKnob>,
    /// Binding sequence per knob, parallel to `knobs`
    bound_at: Vec<u64>,
    next_binding: u64,
    arbiter: LearnArbiter,
    /// MIDI panel visible; learn is only available while shown
    show_midi: bool,
    sensitivity: f32,
    wheel_factor: f32,
}

impl ControlSurface {
    pub fn from_registry(registry: &PromptRegistry, sensitivity: f32, wheel_factor: f32) -> Self {
        let mut surface = Self {
            knobs: Vec::new(),
            bound_at: Vec::new(),
            next_binding: 0,
            arbiter: LearnArbiter::new(),
            show_midi: false,
            sensitivity,
            wheel_factor,
        };
        surface.sync(registry);
        surface
    }

    /// Rebuild knobs from the registry (after a preset load)
    ///
    /// Learn is cancelled when its holder no longer exists.
    pub fn sync(&mut self, registry: &PromptRegistry) {
        self.knobs = registry
            .prompts()
            .iter()
            .cloned()
            .map(|p| ParameterKnob::with_sensitivity(p, self.sensitivity, self.wheel_factor))
            .collect();
        self.bound_at = (0..self.knobs.len() as u64).collect();
        self.next_binding = self.knobs.len() as u64;

        if let Some(holder) = self.arbiter.holder() {
            if registry.get(holder).is_none() {
                log::debug!("surface: learn target '{}' gone, cancelling", holder);
                self.arbiter.cancel();
            }
        }
    }

    pub fn knobs(&self) -> &[ParameterKnob] {
        &self.knobs
    }

    pub fn knob(&self, prompt_id: &str) -> Option<&ParameterKnob> {
        self.knobs.iter().find(|k| k.prompt_id() == prompt_id)
    }

    fn knob_mut(&mut self, prompt_id: &str) -> Option<&mut ParameterKnob> {
        let knob = self.knobs.iter_mut().find(|k| k.prompt_id() == prompt_id);
        if knob.is_none() {
            log::warn!("surface: no knob for prompt '{}'", prompt_id);
        }
        knob
    }

    pub fn arbiter(&self) -> &LearnArbiter {
        &self.arbiter
    }

    pub fn learning(&self) -> Option<&str> {
        self.arbiter.holder()
    }

    pub fn show_midi(&self) -> bool {
        self.show_midi
    }

    /// Show or hide the MIDI panel; hiding cancels learn and every drag
    pub fn set_show_midi(&mut self, show: bool) {
        self.show_midi = show;
        if !show {
            if let Some(holder) = self.arbiter.cancel() {
                log::debug!("surface: learn on '{}' cancelled (panel hidden)", holder);
            }
            for knob in &mut self.knobs {
                knob.cancel_drag();
            }
        }
    }

    /// Toggle learn on `prompt_id`; returns whether it is learning afterwards
    pub fn toggle_learn(&mut self, prompt_id: &str) -> bool {
        if !self.show_midi {
            log::debug!("surface: learn ignored while MIDI panel hidden");
            return false;
        }
        if self.knob(prompt_id).is_none() {
            log::warn!("surface: cannot learn unknown prompt '{}'", prompt_id);
            return false;
        }
        self.arbiter.toggle(prompt_id)
    }

    /// Knob that currently follows `cc` (the most recently bound one)
    pub fn cc_owner(&self, cc: u8) -> Option<&str> {
        self.owner_index(cc).map(|i| self.knobs[i].prompt_id())
    }

    fn owner_index(&self, cc: u8) -> Option<usize> {
        self.knobs
            .iter()
            .zip(&self.bound_at)
            .enumerate()
            .filter(|(_, (knob, _))| knob.bound_cc() == cc)
            .max_by_key(|(_, (_, seq))| **seq)
            .map(|(index, _)| index)
    }

    /// Route one CC message
    ///
    /// A knob in learn mode takes the message and becomes the newest binding
    /// for its CC. Otherwise the message goes to the owner of its CC number.
    pub fn handle_cc(&mut self, message: &CcMessage) -> Option<PromptChanged> {
        let learner = self
            .arbiter
            .holder()
            .and_then(|holder| self.knobs.iter().position(|k| k.prompt_id() == holder));

        let index = match learner {
            Some(index) => {
                self.bound_at[index] = self.next_binding;
                self.next_binding += 1;
                index
            }
            None => self.owner_index(message.cc)?,
        };
        self.knobs[index].handle_cc(message, &mut self.arbiter)
    }

    pub fn press(&mut self, prompt_id: &str, y: f32) {
        if let Some(knob) = self.knob_mut(prompt_id) {
            knob.press(y);
        }
    }

    pub fn drag_to(&mut self, prompt_id: &str, y: f32) -> Option<PromptChanged> {
        self.knob_mut(prompt_id)?.drag_to(y)
    }

    pub fn release(&mut self, prompt_id: &str) {
        if let Some(knob) = self.knob_mut(prompt_id) {
            knob.release();
        }
    }

    pub fn wheel(&mut self, prompt_id: &str, delta_y: f32) -> Option<PromptChanged> {
        Some(self.knob_mut(prompt_id)?.wheel(delta_y))
    }
}
