//! PromptDJ host - MIDI-controlled prompt weights from the terminal
//!
//! This is the command-line entry point. It:
//! 1. Loads the YAML config and the stored user presets
//! 2. Enumerates MIDI inputs and routes the active one into the session
//! 3. Reads line commands from stdin and logs every registry change
//!
//! ## Command line flags
//!
//! - `--config <path>`: Use a config file other than the default location
//! - `--list-devices`: Print MIDI inputs and exit
//! - `--device <id>`: Select the active MIDI input
//! - `--preset <name>`: Preset to activate at startup
//! - `--write-config`: Write the effective config to its path and exit

mod commands;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use commands::{Command, HELP};
use promptdj_core::config::{default_config_path, load_config, save_config, PromptDjConfig};
use promptdj_core::{defaults, Event, FileStore};
use promptdj_midi::{MidiBindingEngine, MidirBackend, Session};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    list_devices: bool,
    device: Option<String>,
    preset: Option<String>,
    write_config: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    parsed.config = Some(args.next().context("--config needs a path")?.into())
                }
                "--list-devices" => parsed.list_devices = true,
                "--device" => parsed.device = Some(args.next().context("--device needs an id")?),
                "--preset" => parsed.preset = Some(args.next().context("--preset needs a name")?),
                "--write-config" => parsed.write_config = true,
                other => bail!("unknown argument '{}'", other),
            }
        }
        Ok(parsed)
    }
}

fn main() {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    log::info!("promptdj starting up");

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let mut config: PromptDjConfig = load_config(&config_path);
    if let Some(ref preset) = args.preset {
        config.initial_preset = Some(preset.clone());
    }

    if args.write_config {
        save_config(&config, &config_path)?;
        println!("Wrote {}", config_path.display());
        return Ok(());
    }

    let mut engine = MidiBindingEngine::new(
        Box::new(MidirBackend::new(config.midi_client_name.as_str())),
        config.auto_select_first_device,
    );

    if args.list_devices {
        let devices = engine.list_devices()?;
        if devices.is_empty() {
            println!("No MIDI inputs found");
        }
        for device in devices {
            println!("{}\t{}", device.id, device.display_name);
        }
        return Ok(());
    }

    let storage = FileStore::new(config.storage_dir.clone());
    let mut session = Session::new(&config, defaults::default_presets(), Box::new(storage))
        .context("Failed to start session")?;
    let events = session.subscribe();

    let midi_available = match engine.list_devices() {
        Ok(devices) => {
            log::info!("MIDI: {} input(s) available", devices.len());
            true
        }
        Err(e) => {
            // MIDI is optional; pointer and command input keep working
            log::warn!("MIDI: Continuing without MIDI ({})", e);
            session.notify(e.to_string());
            engine.release();
            false
        }
    };
    if midi_available {
        if let Some(ref device) = args.device {
            engine.set_active_device(Some(device.as_str()));
        }
        session.set_show_midi(true);
    }

    let commands = spawn_stdin_reader();
    println!("{}", HELP);
    session.publish_state();

    loop {
        if midi_available {
            session.pump_midi(&mut engine);
        }

        match commands.recv_timeout(Duration::from_millis(1)) {
            Ok(Command::Quit) | Err(flume::RecvTimeoutError::Disconnected) => break,
            Ok(command) => execute(command, &mut session, &mut engine, midi_available),
            Err(flume::RecvTimeoutError::Timeout) => {}
        }

        for event in events.try_iter() {
            log_event(&event);
        }

        if let Some(frame) = session.poll_feedback(Instant::now()) {
            log::debug!("feedback: {}", frame.background_css());
        }
    }

    engine.release();
    log::info!("promptdj shutting down");
    Ok(())
}

/// Read stdin lines on a background thread; EOF ends the session
fn spawn_stdin_reader() -> flume::Receiver<Command> {
    let (tx, rx) = flume::unbounded();
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match Command::parse(&line) {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            return;
                        }
                    }
                    Err(e) => eprintln!("{:#}\n{}", e, HELP),
                }
            }
            let _ = tx.send(Command::Quit);
        })
        .ok();
    rx
}

fn execute(
    command: Command,
    session: &mut Session,
    engine: &mut MidiBindingEngine,
    midi_available: bool,
) {
    let result = match command {
        Command::Presets => {
            for name in session.presets().names() {
                let marker = if name == session.presets().active() { "*" } else { " " };
                println!("{} {}", marker, name);
            }
            Ok(())
        }
        Command::Preset(name) => session.switch_preset(&name),
        Command::Save { name, overwrite } => session.save_preset(&name, overwrite).map(|_| ()),
        Command::Delete(name) => session.delete_preset(&name),
        Command::ShowMidi(show) => {
            session.set_show_midi(show && midi_available);
            Ok(())
        }
        Command::Learn(prompt_id) => {
            let learning = session.toggle_learn(&prompt_id);
            println!(
                "learn {} on {}",
                if learning { "armed" } else { "off" },
                prompt_id
            );
            Ok(())
        }
        Command::Device(id) => {
            if midi_available {
                engine.set_active_device(id.as_deref());
            } else {
                log::warn!("MIDI: Not available, ignoring device selection");
            }
            Ok(())
        }
        Command::Wheel { prompt_id, delta_y } => {
            session.wheel(&prompt_id, delta_y);
            Ok(())
        }
        Command::Level(level) => {
            session.set_audio_level(level);
            Ok(())
        }
        Command::Filter { text, reason } => {
            session.mark_filtered(&text, &reason);
            Ok(())
        }
        Command::Quit => Ok(()),
    };

    if let Err(e) = result {
        log::warn!("{}", e);
        session.notify(e.to_string());
    }
}

fn log_event(event: &Event) {
    match event {
        Event::RegistryChanged { prompts } => {
            let active: Vec<String> = prompts
                .iter()
                .filter(|p| p.weight > 0.0)
                .map(|p| format!("{}={:.2}", p.text, p.weight))
                .collect();
            log::info!("prompts: {}", active.join(", "));
        }
        Event::PresetSwitched { name } => log::info!("preset: '{}' active", name),
        Event::PresetsChanged { names } => log::info!("presets: {}", names.join(" | ")),
        Event::PromptFiltered { text, reason } => {
            log::warn!("filtered: '{}' ({})", text, reason)
        }
        Event::Notice { message } => eprintln!("! {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--config", "/tmp/c.yaml", "--device", "nano", "--preset", "Lo-Fi Study"])
            .unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("/tmp/c.yaml")));
        assert_eq!(parsed.device.as_deref(), Some("nano"));
        assert_eq!(parsed.preset.as_deref(), Some("Lo-Fi Study"));
        assert!(!parsed.list_devices);
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--bogus"]).is_err());
        assert!(args(&["--list-devices"]).unwrap().list_devices);
    }
}
