//! Platform MIDI capability seam
//!
//! `MidirBackend` talks to the OS; `VirtualBackend` is an in-process stand-in
//! for hosts without MIDI hardware and for tests.

use super::input::MidiPacket;
use flume::Sender;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A discovered MIDI input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiDevice {
    pub id: String,
    pub display_name: String,
}

impl MidiDevice {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Recoverable MIDI capability failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MidiAccessError {
    #[error("MIDI is not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    #[error("MIDI access was denied: {0}")]
    AccessDenied(String),
}

/// Source of MIDI devices and packets
pub trait MidiBackend {
    /// Enumerate input devices
    fn enumerate(&mut self) -> Result<Vec<MidiDevice>, MidiAccessError>;

    /// Start forwarding packets from every device in `devices` into `sink`
    fn listen(
        &mut self,
        devices: &[MidiDevice],
        sink: Sender<MidiPacket>,
    ) -> Result<(), MidiAccessError>;

    /// Drop every listener and connection
    fn release(&mut self);
}

/// Shared handle used to inject packets into a `VirtualBackend`
#[derive(Debug, Clone, Default)]
pub struct VirtualPort {
    sink: Arc<Mutex<Option<Sender<MidiPacket>>>>,
    enumerations: Arc<AtomicUsize>,
}

impl VirtualPort {
    /// Deliver raw bytes as if `device_id` had sent them
    ///
    /// Returns false when nothing is listening.
    pub fn send(&self, device_id: &str, bytes: &[u8]) -> bool {
        let guard = match self.sink.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        guard
            .as_ref()
            .map(|tx| tx.send(MidiPacket::new(device_id, bytes)).is_ok())
            .unwrap_or(false)
    }

    /// Whether a listener is currently attached
    pub fn is_listening(&self) -> bool {
        self.sink.lock().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Number of times the backend has been enumerated
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::Relaxed)
    }
}

/// In-process backend with a fixed device list
#[derive(Debug, Clone)]
pub struct VirtualBackend {
    devices: Vec<MidiDevice>,
    failure: Option<MidiAccessError>,
    listen_failure: Option<MidiAccessError>,
    port: VirtualPort,
}

impl VirtualBackend {
    pub fn new(devices: Vec<MidiDevice>) -> Self {
        Self {
            devices,
            failure: None,
            listen_failure: None,
            port: VirtualPort::default(),
        }
    }

    /// A backend whose enumeration always fails with `error`
    pub fn failing(error: MidiAccessError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(Vec::new())
        }
    }

    /// A backend that enumerates `devices` but fails part-way through
    /// attaching, leaving the listener attached
    pub fn failing_listen(devices: Vec<MidiDevice>, error: MidiAccessError) -> Self {
        Self {
            listen_failure: Some(error),
            ..Self::new(devices)
        }
    }

    /// Handle for injecting packets
    pub fn port(&self) -> VirtualPort {
        self.port.clone()
    }
}

impl MidiBackend for VirtualBackend {
    fn enumerate(&mut self) -> Result<Vec<MidiDevice>, MidiAccessError> {
        self.port.enumerations.fetch_add(1, Ordering::Relaxed);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.devices.clone()),
        }
    }

    fn listen(
        &mut self,
        _devices: &[MidiDevice],
        sink: Sender<MidiPacket>,
    ) -> Result<(), MidiAccessError> {
        if let Ok(mut guard) = self.port.sink.lock() {
            *guard = Some(sink);
        }
        match &self.listen_failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn release(&mut self) {
        if let Ok(mut guard) = self.port.sink.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_port_delivers_while_listening() {
        let mut backend = VirtualBackend::new(vec![MidiDevice::new("a", "Device A")]);
        let port = backend.port();
        assert!(!port.send("a", &[0xB0, 1, 2]));

        let (tx, rx) = flume::unbounded();
        let devices = backend.enumerate().unwrap();
        backend.listen(&devices, tx).unwrap();
        assert!(port.is_listening());
        assert!(port.send("a", &[0xB0, 1, 2]));
        assert_eq!(rx.try_recv().unwrap(), MidiPacket::new("a", &[0xB0, 1, 2]));

        backend.release();
        assert!(!port.is_listening());
        assert!(!port.send("a", &[0xB0, 1, 2]));
    }

    #[test]
    fn test_failing_backend() {
        let mut backend =
            VirtualBackend::failing(MidiAccessError::AccessDenied("user said no".into()));
        let port = backend.port();
        assert!(matches!(
            backend.enumerate(),
            Err(MidiAccessError::AccessDenied(_))
        ));
        assert_eq!(port.enumerations(), 1);
    }
}
