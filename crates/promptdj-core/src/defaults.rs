//! Built-in prompt palette and default presets
//!
//! Handed to `PresetStore::new` explicitly; nothing reads this table
//! through a global.

use crate::preset::Preset;
use crate::prompt::Prompt;

/// Prompt texts in display order
pub const PROMPT_TEXTS: [&str; 16] = [
    "Bossa Nova",
    "Chillwave",
    "Drum and Bass",
    "Post Punk",
    "Shoegaze",
    "Funk",
    "Chiptune",
    "Lush Strings",
    "Sparkling Arpeggios",
    "Staccato Rhythms",
    "Punchy Kick",
    "Dubstep",
    "K Pop",
    "Neo Soul",
    "Trip Hop",
    "Thrash",
];

/// Palette cycled across prompts
pub const COLORS: [&str; 8] = [
    "#9900ff", "#5200ff", "#ff25f6", "#2af6de", "#ffdd28", "#3dffab", "#d8ff3e", "#d9b2ff",
];

/// Default presets as (name, weight per prompt)
const DEFAULT_WEIGHTS: [(&str, [f32; 16]); 3] = [
    (
        "Ambient Dreams",
        [
            0.0, 1.0, 0.0, 0.0, 1.2, 0.0, 0.0, 1.0, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.4, 0.0,
        ],
    ),
    (
        "Club Night",
        [
            0.0, 0.0, 1.2, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.5, 1.5, 0.7, 0.0, 0.0, 0.0, 0.0,
        ],
    ),
    (
        "Lo-Fi Study",
        [
            1.0, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.8, 0.0,
        ],
    ),
];

/// The full palette with the given weights, ids `prompt-N`, CC `N`
pub fn palette(weights: &[f32; 16]) -> Vec<Prompt> {
    PROMPT_TEXTS
        .iter()
        .zip(weights)
        .enumerate()
        .map(|(i, (text, weight))| {
            Prompt::new(
                format!("prompt-{}", i),
                *text,
                *weight,
                COLORS[i % COLORS.len()],
                i as u8,
            )
        })
        .collect()
}

/// Built-in presets; the first one is the fallback preset
pub fn default_presets() -> Vec<Preset> {
    DEFAULT_WEIGHTS
        .iter()
        .map(|(name, weights)| Preset::new(*name, palette(weights)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_presets_share_palette() {
        let presets = default_presets();
        assert_eq!(presets[0].name, "Ambient Dreams");
        for preset in &presets {
            assert_eq!(preset.prompts.len(), 16);
            assert_eq!(preset.prompts[3].prompt_id, "prompt-3");
            assert_eq!(preset.prompts[3].text, "Post Punk");
            assert_eq!(preset.prompts[9].color, "#5200ff");
            assert_eq!(preset.prompts[15].cc, 15);
        }
    }
}
