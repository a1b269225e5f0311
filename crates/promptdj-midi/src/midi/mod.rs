//! MIDI protocol backend
//!
//! Device discovery, raw input parsing and CC fan-out. The platform layer
//! sits behind `MidiBackend` so hosts without MIDI keep working.

pub mod backend;
pub mod connection;
pub mod engine;
pub mod input;

pub use backend::{MidiAccessError, MidiBackend, MidiDevice, VirtualBackend, VirtualPort};
pub use connection::MidirBackend;
pub use engine::MidiBindingEngine;
pub use input::{CcMessage, MidiPacket};
