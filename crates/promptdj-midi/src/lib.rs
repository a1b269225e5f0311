//! MIDI controller support for PromptDJ
//!
//! This crate provides:
//! - MIDI device enumeration and input via midir
//! - Active-device routing and CC parsing
//! - Prompt weight knobs driven by drag, wheel and CC
//! - MIDI learn with a single shared learn token
//! - The session wiring knobs into the registry, presets and feedback
//!
//! # Architecture
//!
//! ```text
//! MIDI Device → midir callback → flume channel → MidiBindingEngine::pump()
//!     → Session::handle_cc → ControlSurface → ParameterKnob → PromptRegistry → Event
//! ```
//!
//! The midir callback runs on the driver thread and only enqueues raw
//! packets; everything after the channel runs on the host's thread.

mod knob;
mod learn;
pub mod midi;
mod session;
mod surface;

pub use knob::{ParameterKnob, PromptChanged};
pub use learn::LearnArbiter;
pub use midi::{
    CcMessage, MidiAccessError, MidiBackend, MidiBindingEngine, MidiDevice, MidiPacket,
    MidirBackend, VirtualBackend, VirtualPort,
};
pub use session::Session;
pub use surface::ControlSurface;
