//! MIDI port discovery and connection via midir
//!
//! Uses midir for cross-platform MIDI input (ALSA on Linux, CoreMIDI on macOS,
//! WinMM on Windows). Every input port gets its own connection; the engine
//! filters by active device, so switching devices never reconnects.

use super::backend::{MidiAccessError, MidiBackend, MidiDevice};
use super::input::MidiPacket;
use flume::{Sender, TrySendError};
use midir::{MidiInput, MidiInputConnection};

/// Platform backend built on midir
pub struct MidirBackend {
    client_name: String,
    connections: Vec<MidiInputConnection<()>>,
}

impl MidirBackend {
    pub fn new(client_name: impl Into<String>) -> Self {
        Self {
            client_name: client_name.into(),
            connections: Vec::new(),
        }
    }

    fn open_input(&self, suffix: &str) -> Result<MidiInput, MidiAccessError> {
        MidiInput::new(&format!("{}-{}", self.client_name, suffix))
            .map_err(|e| classify_init_error(&e.to_string()))
    }
}

/// Map a platform init failure onto the capability taxonomy
pub fn classify_init_error(message: &str) -> MidiAccessError {
    let lower = message.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not permitted")
    {
        MidiAccessError::AccessDenied(message.to_string())
    } else {
        MidiAccessError::UnsupportedPlatform(message.to_string())
    }
}

/// Port names → stable device ids (duplicates get `#2`, `#3`, ...)
fn device_ids(names: &[String]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let mut id = name.clone();
        let mut n = 1;
        while ids.contains(&id) {
            n += 1;
            id = format!("{} #{}", name, n);
        }
        ids.push(id);
    }
    ids
}

fn port_names(midi_in: &MidiInput) -> Vec<String> {
    midi_in
        .ports()
        .iter()
        .map(|port| {
            midi_in
                .port_name(port)
                .unwrap_or_else(|_| "Unknown MIDI input".to_string())
        })
        .collect()
}

impl MidiBackend for MidirBackend {
    fn enumerate(&mut self) -> Result<Vec<MidiDevice>, MidiAccessError> {
        let midi_in = self.open_input("list")?;
        let names = port_names(&midi_in);
        let devices: Vec<MidiDevice> = device_ids(&names)
            .into_iter()
            .zip(names)
            .map(|(id, name)| MidiDevice::new(id, name))
            .collect();

        log::info!("MIDI: Found {} input port(s)", devices.len());
        for device in &devices {
            log::debug!("  - {}", device.display_name);
        }
        Ok(devices)
    }

    fn listen(
        &mut self,
        devices: &[MidiDevice],
        sink: Sender<MidiPacket>,
    ) -> Result<(), MidiAccessError> {
        self.release();

        for device in devices {
            // connect() consumes the MidiInput, so each port needs its own
            let midi_in = match self.open_input("in") {
                Ok(midi_in) => midi_in,
                Err(e) => {
                    self.release();
                    return Err(e);
                }
            };
            let ports = midi_in.ports();
            let ids = device_ids(&port_names(&midi_in));
            let Some(port) = ids
                .iter()
                .position(|id| *id == device.id)
                .and_then(|index| ports.get(index).cloned())
            else {
                log::warn!("MIDI: Input '{}' disappeared before connect", device.id);
                continue;
            };

            let tx = sink.clone();
            let device_id = device.id.clone();
            let result = midi_in.connect(
                &port,
                "promptdj-input",
                move |_timestamp, data, _| {
                    forward_packet(&tx, MidiPacket::new(device_id.as_str(), data));
                },
                (),
            );

            match result {
                Ok(connection) => {
                    log::info!("MIDI: Listening on '{}'", device.display_name);
                    self.connections.push(connection);
                }
                Err(e) => {
                    log::warn!("MIDI: Failed to connect to '{}': {}", device.display_name, e);
                }
            }
        }
        Ok(())
    }

    fn release(&mut self) {
        if !self.connections.is_empty() {
            log::info!("MIDI: Closing {} input connection(s)", self.connections.len());
        }
        for connection in self.connections.drain(..) {
            connection.close();
        }
    }
}

/// Queue a packet from the MIDI driver thread without blocking
///
/// Returns whether the packet was queued.
fn forward_packet(tx: &Sender<MidiPacket>, packet: MidiPacket) -> bool {
    match tx.try_send(packet) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            log::warn!("MIDI: Packet queue full, dropping message");
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            log::warn!("MIDI: Packet channel closed, dropping message");
            false
        }
    }
}

impl Drop for MidirBackend {
    fn drop(&mut self) {
        self.release();
    }
}
