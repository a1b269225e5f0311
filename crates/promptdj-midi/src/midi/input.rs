//! Raw MIDI packet parsing
//!
//! Only control-change messages (status `0xB0-0xBF`) carry meaning here;
//! everything else is ignored without error. Parsing is done by midly.

use midly::live::LiveEvent;
use midly::MidiMessage;

/// Raw bytes received from one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiPacket {
    /// Id of the device the packet came from
    pub device_id: String,
    pub bytes: Vec<u8>,
}

impl MidiPacket {
    pub fn new(device_id: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            device_id: device_id.into(),
            bytes: bytes.to_vec(),
        }
    }
}

/// A parsed control-change message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CcMessage {
    /// MIDI channel (0-15)
    pub channel: u8,
    /// CC number (0-127)
    pub cc: u8,
    /// Value (0-127)
    pub value: u8,
}

impl CcMessage {
    /// Parse raw MIDI bytes
    ///
    /// Control Change: `0xBn cc vv` (n = channel). Malformed and non-CC
    /// packets yield `None`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        match LiveEvent::parse(data).ok()? {
            LiveEvent::Midi {
                channel,
                message: MidiMessage::Controller { controller, value },
            } => Some(Self {
                channel: channel.as_int(),
                cc: controller.as_int(),
                value: value.as_int(),
            }),
            _ => None,
        }
    }
}
