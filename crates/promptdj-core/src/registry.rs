//! Authoritative prompt registry
//!
//! Ordered mapping `prompt_id → Prompt`; insertion order is display order.
//! The prompt count only changes when a preset is loaded, which replaces
//! the whole registry. Every mutation emits one `RegistryChanged` event
//! carrying the full state.

use crate::events::{Event, EventBus};
use crate::preset::Preset;
use crate::prompt::{Prompt, PromptFields};

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown prompt id: {0}")]
    UnknownPromptId(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptRegistry {
    prompts: Vec<Prompt>,
}

impl PromptRegistry {
    /// Build a registry from prompts in display order
    ///
    /// Later duplicates of an id are dropped so ids stay unique.
    pub fn from_prompts(prompts: impl IntoIterator<Item = Prompt>) -> Self {
        let mut registry = Self::default();
        for prompt in prompts {
            if registry.get(&prompt.prompt_id).is_some() {
                log::warn!("registry: Duplicate prompt id '{}' ignored", prompt.prompt_id);
                continue;
            }
            registry.prompts.push(prompt);
        }
        registry
    }

    pub fn get(&self, prompt_id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.prompt_id == prompt_id)
    }

    /// Prompts in display order
    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Deep copy of the current state
    pub fn snapshot(&self) -> Vec<Prompt> {
        self.prompts.clone()
    }

    /// Merge `fields` into the prompt with `prompt_id` and emit the new state
    ///
    /// On `UnknownPromptId` nothing is mutated and nothing is emitted.
    pub fn apply_change(
        &mut self,
        prompt_id: &str,
        fields: &PromptFields,
        bus: &mut EventBus,
    ) -> Result<(), RegistryError> {
        let prompt = self
            .prompts
            .iter_mut()
            .find(|p| p.prompt_id == prompt_id)
            .ok_or_else(|| RegistryError::UnknownPromptId(prompt_id.to_string()))?;

        fields.apply_to(prompt);
        log::debug!(
            "registry: '{}' -> weight {:.3}, cc {}",
            prompt.prompt_id,
            prompt.weight,
            prompt.cc
        );
        self.emit(bus);
        Ok(())
    }

    /// Replace the registry with a deep copy of `preset` and emit the new state
    pub fn load(&mut self, preset: &Preset, bus: &mut EventBus) {
        *self = Self::from_prompts(preset.prompts.iter().cloned());
        log::info!(
            "registry: Loaded preset '{}' ({} prompts)",
            preset.name,
            self.prompts.len()
        );
        self.emit(bus);
    }

    fn emit(&self, bus: &mut EventBus) {
        bus.emit(Event::RegistryChanged {
            prompts: self.snapshot(),
        });
    }
}
