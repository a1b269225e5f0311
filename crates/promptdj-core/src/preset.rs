//! Named preset snapshots and their persistence
//!
//! Default presets are built in and immutable. User presets are created by
//! explicit save and persisted as one YAML blob under `USER_PRESETS_KEY`.
//! Exactly one preset is active at any time.

use crate::events::{Event, EventBus};
use crate::prompt::Prompt;
use crate::registry::PromptRegistry;
use crate::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage key holding the serialized user presets
pub const USER_PRESETS_KEY: &str = "promptdj.user-presets.v1";

/// A named deep copy of a registry
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub name: String,
    pub prompts: Vec<Prompt>,
}

impl Preset {
    pub fn new(name: impl Into<String>, prompts: Vec<Prompt>) -> Self {
        Self {
            name: name.into(),
            prompts,
        }
    }
}

/// Which class a preset belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetClass {
    Default,
    User,
}

/// Error type for preset store operations
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("Preset name is empty")]
    EmptyName,

    #[error("'{0}' is a built-in preset name")]
    ReservedName(String),

    #[error("Preset '{0}' already exists; overwrite must be confirmed")]
    OverwriteNotConfirmed(String),

    #[error("Built-in preset '{0}' cannot be deleted")]
    CannotDeleteDefault(String),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("At least one default preset is required")]
    NoDefaultPresets,

    #[error("Failed to persist presets: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Whether `save` may replace an existing user preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overwrite {
    /// Fail with `OverwriteNotConfirmed` if the name exists
    Deny,
    /// Caller confirmed replacing the existing preset
    Confirmed,
}

/// One persisted prompt entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PersistedEntry {
    prompt_id: String,
    prompt: Prompt,
}

/// Serialize user presets: `name → ordered [(prompt_id, prompt)]`
pub fn serialize_presets(presets: &BTreeMap<String, Vec<Prompt>>) -> anyhow::Result<String> {
    use anyhow::Context;

    let persisted: BTreeMap<&str, Vec<PersistedEntry>> = presets
        .iter()
        .map(|(name, prompts)| {
            let entries = prompts
                .iter()
                .map(|p| PersistedEntry {
                    prompt_id: p.prompt_id.clone(),
                    prompt: p.clone(),
                })
                .collect();
            (name.as_str(), entries)
        })
        .collect();

    serde_yaml::to_string(&persisted).context("Failed to serialize presets to YAML")
}

/// Parse a blob written by `serialize_presets`
///
/// The entry key wins over an id embedded in the prompt body. Weights and CC
/// numbers are clamped back into range, since the blob may have been edited
/// outside the app.
pub fn deserialize_presets(blob: &str) -> anyhow::Result<BTreeMap<String, Vec<Prompt>>> {
    use anyhow::Context;

    if blob.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let persisted: BTreeMap<String, Vec<PersistedEntry>> =
        serde_yaml::from_str(blob).context("Failed to parse persisted presets")?;

    Ok(persisted
        .into_iter()
        .map(|(name, entries)| {
            let prompts = entries
                .into_iter()
                .map(|entry| {
                    let PersistedEntry { prompt_id, prompt } = entry;
                    Prompt::new(prompt_id, prompt.text, prompt.weight, prompt.color, prompt.cc)
                })
                .collect();
            (name, prompts)
        })
        .collect())
}

/// Default presets plus persisted user presets
pub struct PresetStore {
    defaults: Vec<Preset>,
    user: BTreeMap<String, Preset>,
    active: String,
    storage: Box<dyn KeyValueStore + Send>,
}

impl PresetStore {
    /// Build a store from the default table and a storage backend
    ///
    /// Missing or malformed stored data means "no user presets". The first
    /// default preset starts active.
    pub fn new(
        defaults: Vec<Preset>,
        storage: Box<dyn KeyValueStore + Send>,
    ) -> Result<Self, PresetError> {
        let active = defaults
            .first()
            .map(|p| p.name.clone())
            .ok_or(PresetError::NoDefaultPresets)?;

        let mut store = Self {
            defaults,
            user: BTreeMap::new(),
            active,
            storage,
        };
        store.user = store.load_user_presets();
        log::info!(
            "presets: {} default, {} user preset(s)",
            store.defaults.len(),
            store.user.len()
        );
        Ok(store)
    }

    fn load_user_presets(&self) -> BTreeMap<String, Preset> {
        let blob = match self.storage.get(USER_PRESETS_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return BTreeMap::new(),
            Err(e) => {
                log::warn!("presets: Failed to read stored presets: {:#}", e);
                return BTreeMap::new();
            }
        };

        let parsed = match deserialize_presets(&blob) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("presets: Ignoring malformed stored presets: {:#}", e);
                return BTreeMap::new();
            }
        };

        parsed
            .into_iter()
            .filter(|(name, _)| {
                let reserved = self.is_default(name);
                if reserved {
                    log::warn!("presets: Stored preset '{}' shadows a default, skipped", name);
                }
                !reserved && !name.trim().is_empty()
            })
            .map(|(name, prompts)| (name.clone(), Preset::new(name, prompts)))
            .collect()
    }

    fn persist(&mut self, user: &BTreeMap<String, Preset>) -> anyhow::Result<()> {
        let snapshot: BTreeMap<String, Vec<Prompt>> = user
            .iter()
            .map(|(name, preset)| (name.clone(), preset.prompts.clone()))
            .collect();
        let blob = serialize_presets(&snapshot)?;
        self.storage.set(USER_PRESETS_KEY, &blob)
    }

    pub fn is_default(&self, name: &str) -> bool {
        self.defaults.iter().any(|p| p.name == name)
    }

    pub fn class_of(&self, name: &str) -> Option<PresetClass> {
        if self.is_default(name) {
            Some(PresetClass::Default)
        } else if self.user.contains_key(name) {
            Some(PresetClass::User)
        } else {
            None
        }
    }

    pub fn get(&self, name: &str) -> Option<&Preset> {
        self.defaults
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.user.get(name))
    }

    /// Default names in table order, then user names sorted
    pub fn names(&self) -> Vec<String> {
        self.defaults
            .iter()
            .map(|p| p.name.clone())
            .chain(self.user.keys().cloned())
            .collect()
    }

    pub fn user_names(&self) -> Vec<String> {
        self.user.keys().cloned().collect()
    }

    /// Name of the active preset
    pub fn active(&self) -> &str {
        &self.active
    }

    pub fn active_preset(&self) -> Option<&Preset> {
        self.get(&self.active)
    }

    /// The fallback preset (first default)
    pub fn fallback(&self) -> &Preset {
        &self.defaults[0]
    }

    /// Snapshot `registry` as a user preset named `name` (trimmed)
    ///
    /// On success the preset becomes active and all user presets are
    /// persisted. Returns the stored name.
    pub fn save(
        &mut self,
        name: &str,
        registry: &PromptRegistry,
        overwrite: Overwrite,
        bus: &mut EventBus,
    ) -> Result<String, PresetError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PresetError::EmptyName);
        }
        if self.is_default(name) {
            return Err(PresetError::ReservedName(name.to_string()));
        }
        let exists = self.user.contains_key(name);
        if exists && overwrite == Overwrite::Deny {
            return Err(PresetError::OverwriteNotConfirmed(name.to_string()));
        }

        let mut user = self.user.clone();
        user.insert(name.to_string(), Preset::new(name, registry.snapshot()));
        self.persist(&user)?;

        self.user = user;
        self.active = name.to_string();
        log::info!(
            "presets: {} '{}'",
            if exists { "Overwrote" } else { "Saved" },
            name
        );

        bus.emit(Event::PresetsChanged {
            names: self.names(),
        });
        bus.emit(Event::PresetSwitched {
            name: name.to_string(),
        });
        Ok(name.to_string())
    }

    /// Delete a user preset
    ///
    /// Deleting the active preset falls back to the first default and
    /// reloads `registry` from it.
    pub fn delete(
        &mut self,
        name: &str,
        registry: &mut PromptRegistry,
        bus: &mut EventBus,
    ) -> Result<(), PresetError> {
        if self.is_default(name) {
            return Err(PresetError::CannotDeleteDefault(name.to_string()));
        }
        if !self.user.contains_key(name) {
            return Err(PresetError::UnknownPreset(name.to_string()));
        }

        let mut user = self.user.clone();
        user.remove(name);
        self.persist(&user)?;
        self.user = user;
        log::info!("presets: Deleted '{}'", name);

        bus.emit(Event::PresetsChanged {
            names: self.names(),
        });

        if self.active == name {
            let fallback = self.fallback().clone();
            self.activate(&fallback, registry, bus);
        }
        Ok(())
    }

    /// Make `name` active and load it into `registry`
    pub fn switch_to(
        &mut self,
        name: &str,
        registry: &mut PromptRegistry,
        bus: &mut EventBus,
    ) -> Result<(), PresetError> {
        let preset = self
            .get(name)
            .cloned()
            .ok_or_else(|| PresetError::UnknownPreset(name.to_string()))?;
        self.activate(&preset, registry, bus);
        Ok(())
    }

    fn activate(&mut self, preset: &Preset, registry: &mut PromptRegistry, bus: &mut EventBus) {
        self.active = preset.name.clone();
        registry.load(preset, bus);
        bus.emit(Event::PresetSwitched {
            name: preset.name.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::default_presets;
    use crate::storage::MemoryStore;
    use proptest::prelude::*;

    fn store_with(storage: MemoryStore) -> PresetStore {
        PresetStore::new(default_presets(), Box::new(storage)).unwrap()
    }

    fn registry_changes(rx: &flume::Receiver<Event>) -> Vec<Vec<Prompt>> {
        rx.try_iter()
            .filter_map(|e| match e {
                Event::RegistryChanged { prompts } => Some(prompts),
                _ => None,
            })
            .collect()
    }

    fn small_registry(weight: f32) -> PromptRegistry {
        PromptRegistry::from_prompts([
            Prompt::new("p0", "Funk", weight, "#fff", 3),
            Prompt::new("p1", "Neo Soul", 0.0, "#000", 4),
        ])
    }

    #[test]
    fn test_first_default_starts_active() {
        let store = store_with(MemoryStore::new());
        assert_eq!(store.active(), "Ambient Dreams");
        assert_eq!(store.class_of("Ambient Dreams"), Some(PresetClass::Default));
    }

    #[test]
    fn test_requires_defaults() {
        let err = PresetStore::new(Vec::new(), Box::new(MemoryStore::new()));
        assert!(matches!(err, Err(PresetError::NoDefaultPresets)));
    }

    #[test]
    fn test_save_rejects_reserved_and_empty() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();
        let registry = small_registry(1.0);

        assert!(matches!(
            store.save("Ambient Dreams", &registry, Overwrite::Confirmed, &mut bus),
            Err(PresetError::ReservedName(_))
        ));
        assert!(matches!(
            store.save("", &registry, Overwrite::Deny, &mut bus),
            Err(PresetError::EmptyName)
        ));
        assert!(matches!(
            store.save("   ", &registry, Overwrite::Deny, &mut bus),
            Err(PresetError::EmptyName)
        ));
        assert!(store.user_names().is_empty());
    }

    #[test]
    fn test_save_trims_activates_and_persists() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();

        let name = store
            .save("  Late Set ", &small_registry(1.0), Overwrite::Deny, &mut bus)
            .unwrap();
        assert_eq!(name, "Late Set");
        assert_eq!(store.active(), "Late Set");
        assert_eq!(store.class_of("Late Set"), Some(PresetClass::User));

        let blob = store.storage.get(USER_PRESETS_KEY).unwrap().unwrap();
        let persisted = deserialize_presets(&blob).unwrap();
        assert_eq!(persisted.keys().collect::<Vec<_>>(), vec!["Late Set"]);
        assert!(!blob.contains("Ambient Dreams"));
    }

    #[test]
    fn test_overwrite_requires_confirmation() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();
        store
            .save("Mine", &small_registry(1.0), Overwrite::Deny, &mut bus)
            .unwrap();

        assert!(matches!(
            store.save("Mine", &small_registry(2.0), Overwrite::Deny, &mut bus),
            Err(PresetError::OverwriteNotConfirmed(_))
        ));
        assert_eq!(store.get("Mine").unwrap().prompts[0].weight, 1.0);

        store
            .save("Mine", &small_registry(2.0), Overwrite::Confirmed, &mut bus)
            .unwrap();
        assert_eq!(store.get("Mine").unwrap().prompts[0].weight, 2.0);
    }

    #[test]
    fn test_saved_preset_is_a_deep_copy() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();
        let mut registry = small_registry(1.0);
        store
            .save("Snap", &registry, Overwrite::Deny, &mut bus)
            .unwrap();

        registry
            .apply_change("p0", &crate::prompt::PromptFields::weight(0.2), &mut bus)
            .unwrap();
        assert_eq!(store.get("Snap").unwrap().prompts[0].weight, 1.0);
    }

    #[test]
    fn test_delete_default_fails_unchanged() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();
        let mut registry = small_registry(1.0);
        let names = store.names();

        assert!(matches!(
            store.delete("Club Night", &mut registry, &mut bus),
            Err(PresetError::CannotDeleteDefault(_))
        ));
        assert_eq!(store.names(), names);
    }

    #[test]
    fn test_delete_active_falls_back_to_first_default() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();
        let mut registry = small_registry(1.0);
        store
            .save("Mine", &registry, Overwrite::Deny, &mut bus)
            .unwrap();

        let rx = bus.subscribe();
        store.delete("Mine", &mut registry, &mut bus).unwrap();

        assert_eq!(store.active(), "Ambient Dreams");
        let changes = registry_changes(&rx);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0], store.fallback().prompts);
        assert_eq!(registry.prompts(), store.fallback().prompts.as_slice());
    }

    #[test]
    fn test_delete_inactive_does_not_reload() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();
        let mut registry = small_registry(1.0);
        store
            .save("Mine", &registry, Overwrite::Deny, &mut bus)
            .unwrap();
        store
            .switch_to("Club Night", &mut registry, &mut bus)
            .unwrap();

        let rx = bus.subscribe();
        store.delete("Mine", &mut registry, &mut bus).unwrap();
        assert!(registry_changes(&rx).is_empty());
        assert_eq!(store.active(), "Club Night");
    }

    #[test]
    fn test_switch_unknown() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();
        let mut registry = small_registry(1.0);
        assert!(matches!(
            store.switch_to("Nope", &mut registry, &mut bus),
            Err(PresetError::UnknownPreset(_))
        ));
        assert_eq!(registry, small_registry(1.0));
    }

    #[test]
    fn test_switch_loads_registry() {
        let mut store = store_with(MemoryStore::new());
        let mut bus = EventBus::new();
        let rx = bus.subscribe();
        let mut registry = small_registry(1.0);

        store
            .switch_to("Lo-Fi Study", &mut registry, &mut bus)
            .unwrap();
        assert_eq!(registry.len(), 16);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(events[0], Event::RegistryChanged { .. }));
        assert_eq!(
            events[1],
            Event::PresetSwitched {
                name: "Lo-Fi Study".to_string()
            }
        );
    }

    #[test]
    fn test_user_presets_survive_restart() {
        let storage = MemoryStore::new();
        {
            let mut store = store_with(storage.clone());
            let mut bus = EventBus::new();
            store
                .save("Keeper", &small_registry(0.7), Overwrite::Deny, &mut bus)
                .unwrap();
        }

        let store = store_with(storage);
        assert_eq!(store.user_names(), vec!["Keeper"]);
        assert_eq!(store.get("Keeper").unwrap().prompts, small_registry(0.7).snapshot());
    }

    #[test]
    fn test_malformed_storage_means_no_user_presets() {
        let mut storage = MemoryStore::new();
        storage.set(USER_PRESETS_KEY, "{{{ not yaml").unwrap();
        let store = store_with(storage);
        assert!(store.user_names().is_empty());
        assert_eq!(store.names().len(), 3);
    }

    #[test]
    fn test_stored_default_name_is_ignored() {
        let mut presets = BTreeMap::new();
        presets.insert("Club Night".to_string(), small_registry(1.0).snapshot());
        presets.insert("Mine".to_string(), small_registry(1.0).snapshot());
        let mut storage = MemoryStore::new();
        storage
            .set(USER_PRESETS_KEY, &serialize_presets(&presets).unwrap())
            .unwrap();

        let store = store_with(storage);
        assert_eq!(store.user_names(), vec!["Mine"]);
        assert_eq!(store.get("Club Night").unwrap().prompts.len(), 16);
    }

    #[test]
    fn test_serialize_roundtrip_preserves_prompt_order() {
        let mut presets = BTreeMap::new();
        presets.insert(
            "Reversed".to_string(),
            vec![
                Prompt::new("z", "Trip Hop", 0.25, "#d9b2ff", 127),
                Prompt::new("a", "Shoegaze", 1.999, "#ffdd28", 0),
            ],
        );
        presets.insert("Empty".to_string(), Vec::new());

        let blob = serialize_presets(&presets).unwrap();
        assert_eq!(deserialize_presets(&blob).unwrap(), presets);
    }

    #[test]
    fn test_deserialize_blank_is_empty() {
        assert!(deserialize_presets("").unwrap().is_empty());
        assert!(deserialize_presets("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_stored_prompts_are_clamped() {
        let blob = r##"
Hot:
  - prompt_id: p0
    prompt:
      prompt_id: p0
      text: Funk
      weight: 7.5
      color: "#fff"
      cc: 200
  - prompt_id: p1
    prompt:
      prompt_id: p1
      text: Neo Soul
      weight: -3.0
      color: "#000"
      cc: 4
"##;
        let mut storage = MemoryStore::new();
        storage.set(USER_PRESETS_KEY, blob).unwrap();
        let mut store = store_with(storage);
        let mut registry = PromptRegistry::default();
        let mut bus = EventBus::new();

        store.switch_to("Hot", &mut registry, &mut bus).unwrap();
        let hot = registry.get("p0").unwrap();
        assert_eq!(hot.weight, 2.0);
        assert_eq!(hot.cc, 127);
        assert_eq!(registry.get("p1").unwrap().weight, 0.0);
    }

    fn preset_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("true".to_string()),
            Just("~".to_string()),
            Just("123".to_string()),
            Just("null".to_string()),
            Just("- dash".to_string()),
            Just("key: value".to_string()),
            "[A-Za-z0-9 #:'-]{1,12}",
        ]
    }

    fn prompt() -> impl Strategy<Value = Prompt> {
        (
            "[a-z0-9-]{1,8}",
            "[A-Za-z ]{0,12}",
            0u8..=16,
            "#[0-9a-f]{6}",
            0u8..=127,
        )
            .prop_map(|(id, text, eighths, color, cc)| {
                // Eighths are exact in binary, so equality survives text
                Prompt::new(id, text, eighths as f32 / 8.0, color, cc)
            })
    }

    proptest! {
        #[test]
        fn test_serialize_roundtrip_any_presets(
            presets in proptest::collection::btree_map(
                preset_name(),
                proptest::collection::vec(prompt(), 0..5),
                0..4,
            )
        ) {
            let blob = serialize_presets(&presets).unwrap();
            prop_assert_eq!(deserialize_presets(&blob).unwrap(), presets);
        }
    }
}
