//! Line commands read from stdin
//!
//! One command per line, e.g. `preset Club Night` or `wheel prompt-3 -40`.

use anyhow::{anyhow, bail, Context, Result};
use promptdj_core::Overwrite;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List presets and the active one
    Presets,
    /// Switch to a preset
    Preset(String),
    /// Save the registry as a user preset
    Save { name: String, overwrite: Overwrite },
    /// Delete a user preset
    Delete(String),
    /// Show or hide the MIDI panel
    ShowMidi(bool),
    /// Toggle learn on a prompt
    Learn(String),
    /// Select the active MIDI device (`None` deselects)
    Device(Option<String>),
    /// Wheel input on a prompt knob
    Wheel { prompt_id: String, delta_y: f32 },
    /// Push an audio level sample
    Level(f32),
    /// Report a prompt as filtered by the generation engine
    Filter { text: String, reason: String },
    Quit,
}

pub const HELP: &str = "\
commands:
  presets                      list presets
  preset <name>                switch preset
  save <name>                  save current prompts as a user preset
  save! <name>                 save, overwriting an existing user preset
  delete <name>                delete a user preset
  midi on|off                  show or hide the MIDI panel
  learn <prompt-id>            toggle MIDI learn on a knob
  device <id>|none             select the active MIDI device
  wheel <prompt-id> <delta>    scroll a knob (negative = up)
  level <0..1>                 set the audio level
  filter <text>[: reason]      mark a prompt as filtered
  quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let arg = |what: &str| -> Result<String> {
            if rest.is_empty() {
                Err(anyhow!("'{}' needs {}", word, what))
            } else {
                Ok(rest.to_string())
            }
        };

        let command = match word {
            "presets" => Command::Presets,
            "preset" => Command::Preset(arg("a preset name")?),
            // Empty names are rejected by the preset store itself
            "save" => Command::Save {
                name: rest.to_string(),
                overwrite: Overwrite::Deny,
            },
            "save!" => Command::Save {
                name: rest.to_string(),
                overwrite: Overwrite::Confirmed,
            },
            "delete" => Command::Delete(arg("a preset name")?),
            "midi" => match rest {
                "on" => Command::ShowMidi(true),
                "off" => Command::ShowMidi(false),
                other => bail!("expected 'midi on' or 'midi off', got '{}'", other),
            },
            "learn" => Command::Learn(arg("a prompt id")?),
            "device" => match arg("a device id")?.as_str() {
                "none" => Command::Device(None),
                id => Command::Device(Some(id.to_string())),
            },
            "wheel" => {
                let (prompt_id, delta) = rest
                    .rsplit_once(char::is_whitespace)
                    .ok_or_else(|| anyhow!("usage: wheel <prompt-id> <delta>"))?;
                let delta_y = delta
                    .parse::<f32>()
                    .with_context(|| format!("invalid wheel delta '{}'", delta))?;
                Command::Wheel {
                    prompt_id: prompt_id.trim().to_string(),
                    delta_y,
                }
            }
            "level" => {
                let level = arg("a level")?;
                Command::Level(
                    level
                        .parse::<f32>()
                        .with_context(|| format!("invalid level '{}'", level))?,
                )
            }
            "filter" => {
                let spec = arg("a prompt text")?;
                let (text, reason) = match spec.split_once(':') {
                    Some((text, reason)) => (text.trim(), reason.trim()),
                    None => (spec.as_str(), "filtered"),
                };
                Command::Filter {
                    text: text.to_string(),
                    reason: reason.to_string(),
                }
            }
            "quit" | "exit" => Command::Quit,
            "" => bail!("empty command"),
            other => bail!("unknown command '{}'", other),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names_with_spaces() {
        assert_eq!(
            Command::parse("preset  Club Night ").unwrap(),
            Command::Preset("Club Night".to_string())
        );
        assert_eq!(
            Command::parse("save! Late Set").unwrap(),
            Command::Save {
                name: "Late Set".to_string(),
                overwrite: Overwrite::Confirmed
            }
        );
    }

    #[test]
    fn test_parse_wheel_and_level() {
        assert_eq!(
            Command::parse("wheel prompt-3 -40").unwrap(),
            Command::Wheel {
                prompt_id: "prompt-3".to_string(),
                delta_y: -40.0
            }
        );
        assert_eq!(Command::parse("level 0.5").unwrap(), Command::Level(0.5));
        assert!(Command::parse("wheel prompt-3").is_err());
        assert!(Command::parse("level loud").is_err());
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(Command::parse("midi off").unwrap(), Command::ShowMidi(false));
        assert_eq!(Command::parse("device none").unwrap(), Command::Device(None));
        assert_eq!(
            Command::parse("filter Thrash: too loud").unwrap(),
            Command::Filter {
                text: "Thrash".to_string(),
                reason: "too loud".to_string()
            }
        );
        assert!(Command::parse("preset").is_err());
        assert!(Command::parse("dance").is_err());
        assert!(Command::parse("   ").is_err());
    }
}
