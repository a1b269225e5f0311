//! MIDI binding engine
//!
//! Owns device enumeration, the active-device routing filter and the
//! fan-out of parsed CC messages.
//!
//! # Architecture
//!
//! ```text
//! MIDI driver thread → backend callback → flume (MidiPacket) → pump() → CcMessage subscribers
//! ```
//!
//! Packets are only parsed and dispatched inside `pump`, so every CC message
//! is handled on the host's own thread, one at a time.

use super::backend::{MidiAccessError, MidiBackend, MidiDevice};
use super::input::{CcMessage, MidiPacket};
use flume::{Receiver, Sender};

pub struct MidiBindingEngine {
    backend: Box<dyn MidiBackend>,
    /// Cached result of the first successful enumeration
    devices: Option<Vec<MidiDevice>>,
    active: Option<String>,
    auto_select_first: bool,
    enumerated_once: bool,
    user_deselected: bool,
    packet_tx: Sender<MidiPacket>,
    packet_rx: Receiver<MidiPacket>,
    subscribers: Vec<Sender<CcMessage>>,
}

impl MidiBindingEngine {
    /// Create an engine over `backend`
    ///
    /// With `auto_select_first`, the first device becomes active after the
    /// very first enumeration, unless the user has deselected a device.
    pub fn new(backend: Box<dyn MidiBackend>, auto_select_first: bool) -> Self {
        let (packet_tx, packet_rx) = flume::bounded(1024);
        Self {
            backend,
            devices: None,
            active: None,
            auto_select_first,
            enumerated_once: false,
            user_deselected: false,
            packet_tx,
            packet_rx,
            subscribers: Vec::new(),
        }
    }

    /// Enumerate devices, requesting access on the first call only
    pub fn list_devices(&mut self) -> Result<Vec<MidiDevice>, MidiAccessError> {
        if let Some(ref devices) = self.devices {
            return Ok(devices.clone());
        }

        let devices = self.backend.enumerate().map_err(|e| {
            log::warn!("MIDI: {}", e);
            e
        })?;
        if let Err(e) = self.backend.listen(&devices, self.packet_tx.clone()) {
            log::warn!("MIDI: Failed to attach listeners: {}", e);
            self.backend.release();
            self.packet_rx.drain().for_each(drop);
            return Err(e);
        }

        let first_enumeration = !self.enumerated_once;
        self.enumerated_once = true;
        if first_enumeration
            && self.auto_select_first
            && !self.user_deselected
            && self.active.is_none()
        {
            if let Some(first) = devices.first() {
                log::info!("MIDI: Auto-selected '{}'", first.display_name);
                self.active = Some(first.id.clone());
            }
        }

        self.devices = Some(devices.clone());
        Ok(devices)
    }

    /// Route messages from `id` only (`None` = no device)
    ///
    /// Unknown ids are accepted; nothing will route until such a device sends.
    pub fn set_active_device(&mut self, id: Option<&str>) {
        match id {
            Some(id) => {
                let known = self
                    .devices
                    .as_ref()
                    .map(|devices| devices.iter().any(|d| d.id == id))
                    .unwrap_or(false);
                if !known {
                    log::debug!("MIDI: Active device '{}' is not enumerated", id);
                }
                self.active = Some(id.to_string());
            }
            None => {
                self.user_deselected = true;
                self.active = None;
            }
        }
        log::info!("MIDI: Active device is now {:?}", self.active);
    }

    pub fn active_device(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Receive every CC message dispatched from now on
    pub fn subscribe(&mut self) -> Receiver<CcMessage> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Filter, parse and dispatch one packet
    pub fn handle_packet(&mut self, packet: &MidiPacket) -> Option<CcMessage> {
        if self.active.as_deref() != Some(packet.device_id.as_str()) {
            log::trace!("[MIDI IN] dropped packet from inactive '{}'", packet.device_id);
            return None;
        }

        let message = CcMessage::parse(&packet.bytes)?;
        log::debug!("[MIDI IN] {:?}", message);
        self.subscribers.retain(|tx| tx.send(message).is_ok());
        Some(message)
    }

    /// Drain packets queued by the backend, in arrival order
    pub fn pump(&mut self) -> Vec<CcMessage> {
        let packets: Vec<MidiPacket> = self.packet_rx.try_iter().collect();
        packets
            .iter()
            .filter_map(|packet| self.handle_packet(packet))
            .collect()
    }

    /// Drop every platform listener, subscriber and queued packet
    ///
    /// The next `list_devices` enumerates again.
    pub fn release(&mut self) {
        self.backend.release();
        self.subscribers.clear();
        self.devices = None;
        let dropped = self.packet_rx.drain().count();
        if dropped > 0 {
            log::debug!("MIDI: Dropped {} queued packet(s) on release", dropped);
        }
    }
}
