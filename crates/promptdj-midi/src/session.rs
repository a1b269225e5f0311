//! Session: knobs → registry → presets → feedback
//!
//! All mutation goes through `&mut Session`, so every input (pointer, wheel,
//! CC, preset action) is applied to completion before the next one starts.
//! A threaded host wraps the session in a single mutex or drives it from one
//! thread and feeds it over a channel.

use crate::knob::PromptChanged;
use crate::midi::{CcMessage, MidiBindingEngine};
use crate::surface::ControlSurface;
use flume::Receiver;
use promptdj_core::config::PromptDjConfig;
use promptdj_core::{
    Event, EventBus, FeedbackFrame, FilteredPromptSet, KeyValueStore, Overwrite, Preset,
    PresetError, PresetStore, PromptRegistry, RegistryError, Throttle,
};
use std::time::Instant;

pub struct Session {
    registry: PromptRegistry,
    presets: PresetStore,
    surface: ControlSurface,
    filtered: FilteredPromptSet,
    bus: EventBus,
    audio_level: f32,
    feedback: Throttle<FeedbackFrame>,
    /// Registry, level or filtered set changed since the last frame
    feedback_dirty: bool,
}

impl Session {
    /// Build a session over the default preset table and a storage backend
    ///
    /// Activates `config.initial_preset` when it names a known preset,
    /// otherwise the first default.
    pub fn new(
        config: &PromptDjConfig,
        defaults: Vec<Preset>,
        storage: Box<dyn KeyValueStore + Send>,
    ) -> Result<Self, PresetError> {
        let mut presets = PresetStore::new(defaults, storage)?;
        let mut registry = PromptRegistry::default();
        let mut bus = EventBus::new();

        let initial = match config.initial_preset.as_deref() {
            Some(name) if presets.get(name).is_some() => name.to_string(),
            Some(name) => {
                log::warn!("session: Unknown initial preset '{}', using fallback", name);
                presets.fallback().name.clone()
            }
            None => presets.fallback().name.clone(),
        };
        presets.switch_to(&initial, &mut registry, &mut bus)?;

        let surface =
            ControlSurface::from_registry(&registry, config.drag_sensitivity, config.wheel_factor);

        Ok(Self {
            registry,
            presets,
            surface,
            filtered: FilteredPromptSet::new(),
            bus,
            audio_level: 0.0,
            feedback: Throttle::new(config.feedback_interval()),
            feedback_dirty: true,
        })
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&mut self) -> Receiver<Event> {
        self.bus.subscribe()
    }

    /// Re-announce the current state (for a subscriber that joined late)
    pub fn publish_state(&mut self) {
        self.bus.emit(Event::PresetsChanged {
            names: self.presets.names(),
        });
        self.bus.emit(Event::PresetSwitched {
            name: self.presets.active().to_string(),
        });
        self.bus.emit(Event::RegistryChanged {
            prompts: self.registry.snapshot(),
        });
    }

    pub fn registry(&self) -> &PromptRegistry {
        &self.registry
    }

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub fn surface(&self) -> &ControlSurface {
        &self.surface
    }

    pub fn filtered(&self) -> &FilteredPromptSet {
        &self.filtered
    }

    pub fn audio_level(&self) -> f32 {
        self.audio_level
    }

    /// Apply a knob change to the registry
    ///
    /// Changes for prompts the registry doesn't know are logged and dropped.
    pub fn apply(&mut self, change: PromptChanged) -> bool {
        match self
            .registry
            .apply_change(&change.prompt_id, &change.fields(), &mut self.bus)
        {
            Ok(()) => {
                self.feedback_dirty = true;
                true
            }
            Err(RegistryError::UnknownPromptId(id)) => {
                log::warn!("session: Dropped change for unknown prompt '{}'", id);
                false
            }
        }
    }

    /// Route one CC message through the surface; returns whether it applied
    pub fn handle_cc(&mut self, message: &CcMessage) -> bool {
        match self.surface.handle_cc(message) {
            Some(change) => self.apply(change),
            None => false,
        }
    }

    /// Drain the engine's queued packets into the session
    pub fn pump_midi(&mut self, engine: &mut MidiBindingEngine) -> usize {
        engine
            .pump()
            .iter()
            .filter(|message| self.handle_cc(message))
            .count()
    }

    pub fn press(&mut self, prompt_id: &str, y: f32) {
        self.surface.press(prompt_id, y);
    }

    pub fn drag_to(&mut self, prompt_id: &str, y: f32) -> bool {
        match self.surface.drag_to(prompt_id, y) {
            Some(change) => self.apply(change),
            None => false,
        }
    }

    pub fn release(&mut self, prompt_id: &str) {
        self.surface.release(prompt_id);
    }

    pub fn wheel(&mut self, prompt_id: &str, delta_y: f32) -> bool {
        match self.surface.wheel(prompt_id, delta_y) {
            Some(change) => self.apply(change),
            None => false,
        }
    }

    pub fn set_show_midi(&mut self, show: bool) {
        self.surface.set_show_midi(show);
    }

    pub fn toggle_learn(&mut self, prompt_id: &str) -> bool {
        self.surface.toggle_learn(prompt_id)
    }

    pub fn switch_preset(&mut self, name: &str) -> Result<(), PresetError> {
        self.presets
            .switch_to(name, &mut self.registry, &mut self.bus)?;
        self.after_registry_reload();
        Ok(())
    }

    /// Save the current registry as a user preset; returns the stored name
    pub fn save_preset(&mut self, name: &str, overwrite: Overwrite) -> Result<String, PresetError> {
        self.presets
            .save(name, &self.registry, overwrite, &mut self.bus)
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<(), PresetError> {
        let was_active = self.presets.active() == name;
        self.presets
            .delete(name, &mut self.registry, &mut self.bus)?;
        if was_active {
            self.after_registry_reload();
        }
        Ok(())
    }

    fn after_registry_reload(&mut self) {
        self.surface.sync(&self.registry);
        self.feedback_dirty = true;
    }

    /// Record that the generation engine rejected `text`
    pub fn mark_filtered(&mut self, text: &str, reason: &str) {
        if self.filtered.insert(text) {
            log::info!("session: Prompt '{}' filtered: {}", text, reason);
            self.feedback_dirty = true;
        }
        self.bus.emit(Event::PromptFiltered {
            text: text.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Forward a recoverable failure to the user-notification channel
    pub fn notify(&mut self, message: impl Into<String>) {
        self.bus.emit(Event::Notice {
            message: message.into(),
        });
    }

    pub fn set_audio_level(&mut self, level: f32) {
        if level != self.audio_level {
            self.audio_level = level;
            self.feedback_dirty = true;
        }
    }

    /// Next feedback frame, throttled to the configured interval
    ///
    /// Call on every tick; a change inside the interval is held back and
    /// released by a later call.
    pub fn poll_feedback(&mut self, now: Instant) -> Option<FeedbackFrame> {
        if self.feedback_dirty {
            self.feedback_dirty = false;
            let frame =
                FeedbackFrame::compute(self.registry.prompts(), self.audio_level, &self.filtered);
            self.feedback.offer(frame, now)
        } else {
            self.feedback.poll(now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptdj_core::defaults::default_presets;
    use promptdj_core::MemoryStore;
    use std::time::Duration;

    fn session() -> Session {
        Session::new(
            &PromptDjConfig::default(),
            default_presets(),
            Box::new(MemoryStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_starts_on_fallback() {
        let session = session();
        assert_eq!(session.presets().active(), "Ambient Dreams");
        assert_eq!(session.registry().len(), 16);
        assert_eq!(session.surface().knobs().len(), 16);
    }

    #[test]
    fn test_initial_preset_from_config() {
        let config = PromptDjConfig {
            initial_preset: Some("Club Night".to_string()),
            ..PromptDjConfig::default()
        };
        let session =
            Session::new(&config, default_presets(), Box::new(MemoryStore::new())).unwrap();
        assert_eq!(session.presets().active(), "Club Night");

        let config = PromptDjConfig {
            initial_preset: Some("Nope".to_string()),
            ..PromptDjConfig::default()
        };
        let session =
            Session::new(&config, default_presets(), Box::new(MemoryStore::new())).unwrap();
        assert_eq!(session.presets().active(), "Ambient Dreams");
    }

    #[test]
    fn test_unknown_change_is_dropped() {
        let mut session = session();
        let rx = session.subscribe();
        let applied = session.apply(PromptChanged {
            prompt_id: "ghost".to_string(),
            text: "Ghost".to_string(),
            weight: 1.0,
            cc: 0,
            color: "#fff".to_string(),
        });
        assert!(!applied);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_feedback_throttled() {
        let mut session = session();
        let t0 = Instant::now();
        assert!(session.poll_feedback(t0).is_some());
        assert!(session.poll_feedback(t0).is_none());

        session.wheel("prompt-0", -100.0);
        assert!(session.poll_feedback(t0 + Duration::from_millis(5)).is_none());
        session.wheel("prompt-0", -100.0);
        assert!(session.poll_feedback(t0 + Duration::from_millis(10)).is_none());

        let frame = session.poll_feedback(t0 + Duration::from_millis(30)).unwrap();
        // The trailing frame reflects the newest state, not the first change
        let expected = FeedbackFrame::compute(session.registry().prompts(), 0.0, session.filtered());
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_mark_filtered_emits_every_time() {
        let mut session = session();
        let rx = session.subscribe();
        session.mark_filtered("Thrash", "blocked");
        session.mark_filtered("Thrash", "blocked");
        assert_eq!(session.filtered().len(), 1);
        assert_eq!(rx.try_iter().count(), 2);
    }
}
