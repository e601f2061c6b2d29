use thiserror::Error;

/// Custom error type for MIDI operations
#[derive(Debug, Error)]
pub enum MidiError {
    /// Error when sending a MIDI message
    #[error("MIDI send error: {0}")]
    SendError(String),
    /// Error when connecting to a MIDI device
    #[error("MIDI connection error: {0}")]
    ConnectionError(String),
    /// No output port matched the requested name
    #[error("MIDI output device not found: {0}")]
    DeviceNotFound(String),
}

pub const NOTE_ON: u8 = 0x90;
pub const NOTE_OFF: u8 = 0x80;
pub const SYSEX_BEGIN: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;

/// Represents a MIDI message that can be sent to the clock hardware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note On message with note number and velocity
    NoteOn { channel: u8, note: u8, velocity: u8 },
    /// Note Off message with note number and velocity
    NoteOff { channel: u8, note: u8, velocity: u8 },
    /// Complete system-exclusive frame, including the 0xF0/0xF7 framing bytes
    SysEx(Vec<u8>),
}

impl MidiMessage {
    /// Raw bytes as written to the wire. Status bytes are the base opcode
    /// plus the channel index.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => vec![NOTE_ON | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => vec![NOTE_OFF | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::SysEx(frame) => frame.clone(),
        }
    }
}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// Trait defining the interface for MIDI output implementations
pub trait MidiEngine: Send {
    /// Sends a MIDI message to the device
    fn send(&mut self, msg: &MidiMessage) -> Result<()>;
}
