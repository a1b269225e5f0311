//! Weight → visual feedback mapping
//!
//! Pure functions turning prompt weights and the live audio level into halo
//! scales and a stack of radial-gradient stops. Rate limiting happens in the
//! consumer via `Throttle`.

use crate::filtered::FilteredPromptSet;
use crate::prompt::{Prompt, MAX_WEIGHT};

/// Halo scale at zero weight
pub const MIN_HALO_SCALE: f32 = 1.0;
/// Halo scale at full weight
pub const MAX_HALO_SCALE: f32 = 2.0;
/// Extra scale per unit of audio level
pub const HALO_LEVEL_MODIFIER: f32 = 1.0;

/// Weight at which a gradient stop reaches `MAX_ALPHA`
pub const MAX_WEIGHT_FOR_FULL_OPACITY: f32 = 0.5;
/// Opacity ceiling for a gradient stop
pub const MAX_ALPHA: f32 = 0.6;
/// Prompts per gradient grid row
pub const GRID_COLUMNS: usize = 4;
/// Opacity multiplier for filtered prompts
pub const FILTERED_OPACITY: f32 = 0.5;

/// Halo drawn around a knob
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Halo {
    pub scale: f32,
}

impl Halo {
    pub fn to_css(&self) -> String {
        format!("scale({})", self.scale)
    }
}

/// Halo for a knob, `None` (hidden) when `weight == 0`
pub fn halo(weight: f32, audio_level: f32) -> Option<Halo> {
    if weight <= 0.0 {
        return None;
    }
    let level = if audio_level.is_nan() { 0.0 } else { audio_level.max(0.0) };
    let scale = MIN_HALO_SCALE
        + (weight / MAX_WEIGHT) * (MAX_HALO_SCALE - MIN_HALO_SCALE)
        + level * HALO_LEVEL_MODIFIER;
    Some(Halo { scale })
}

/// One radial-gradient layer of the background
#[derive(Debug, Clone, PartialEq)]
pub struct GradientStop {
    /// Horizontal centre, 0.0-1.0 across the grid
    pub x: f32,
    /// Vertical centre, 0.0-1.0 for the first four rows
    pub y: f32,
    pub color: String,
    /// Opacity 0.0-`MAX_ALPHA`
    pub alpha: f32,
    /// Spread radius as a fraction of the background (weight / 2)
    pub radius: f32,
}

impl GradientStop {
    /// Stop for the prompt at grid position `index`
    pub fn new(index: usize, weight: f32, color: &str) -> Self {
        let last = (GRID_COLUMNS - 1) as f32;
        let alpha = (weight / MAX_WEIGHT_FOR_FULL_OPACITY).clamp(0.0, 1.0) * MAX_ALPHA;
        Self {
            x: (index % GRID_COLUMNS) as f32 / last,
            y: (index / GRID_COLUMNS) as f32 / last,
            color: color.to_string(),
            alpha,
            radius: weight / MAX_WEIGHT,
        }
    }

    /// CSS `radial-gradient(...)` fragment
    ///
    /// Hex colours (`#rgb` or `#rrggbb`) get the alpha appended as a
    /// `#rrggbbaa` token; anything else is faded with `color-mix`.
    pub fn to_css(&self) -> String {
        let alpha = self.alpha.clamp(0.0, 1.0);
        let (inner, outer) = match expand_hex(&self.color) {
            Some(hex) => (
                format!("{}{:02x}", hex, (alpha * 255.0).round() as u8),
                format!("{}00", hex),
            ),
            None => (
                format!(
                    "color-mix(in srgb, {} {}%, transparent)",
                    self.color,
                    (alpha * 100.0).round()
                ),
                "transparent".to_string(),
            ),
        };
        format!(
            "radial-gradient(circle at {}% {}%, {} 0px, {} {}%)",
            self.x * 100.0,
            self.y * 100.0,
            inner,
            outer,
            self.radius * 100.0
        )
    }
}

/// `#rgb` / `#rrggbb` → lowercase `#rrggbb`
fn expand_hex(color: &str) -> Option<String> {
    let digits = color.strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digits = digits.to_ascii_lowercase();
    match digits.len() {
        3 => Some(digits.chars().fold(String::from("#"), |mut hex, c| {
            hex.push(c);
            hex.push(c);
            hex
        })),
        6 => Some(format!("#{}", digits)),
        _ => None,
    }
}

/// Per-prompt visual state
#[derive(Debug, Clone, PartialEq)]
pub struct PromptFeedback {
    pub prompt_id: String,
    pub halo: Option<Halo>,
    pub filtered: bool,
}

/// Everything needed to redraw after a weight or level change
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackFrame {
    pub prompts: Vec<PromptFeedback>,
    pub gradient: Vec<GradientStop>,
}

impl FeedbackFrame {
    /// Map `prompts` (display order) and the audio level to a frame
    ///
    /// Filtered prompts ignore the audio level and draw at reduced opacity.
    pub fn compute(prompts: &[Prompt], audio_level: f32, filtered: &FilteredPromptSet) -> Self {
        let mut feedback = Vec::with_capacity(prompts.len());
        let mut gradient = Vec::with_capacity(prompts.len());

        for (index, prompt) in prompts.iter().enumerate() {
            let is_filtered = filtered.contains(&prompt.text);
            let level = if is_filtered { 0.0 } else { audio_level };

            feedback.push(PromptFeedback {
                prompt_id: prompt.prompt_id.clone(),
                halo: halo(prompt.weight, level),
                filtered: is_filtered,
            });

            let mut stop = GradientStop::new(index, prompt.weight, &prompt.color);
            if is_filtered {
                stop.alpha *= FILTERED_OPACITY;
            }
            gradient.push(stop);
        }

        Self {
            prompts: feedback,
            gradient,
        }
    }

    /// Comma-joined CSS background-image value
    pub fn background_css(&self) -> String {
        self.gradient
            .iter()
            .map(GradientStop::to_css)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
