//! Wire formats understood by the clock hardware
//!
//! Two variants exist in the field:
//! - a six byte vendor system-exclusive frame
//!   `[F0, device, bpm_whole, bpm_fractional, phase, F7]`
//! - three Note-On messages on one channel (E = whole BPM, F = fractional
//!   BPM, D = phase), with a lone Note-Off on D as the idle signal

use crate::encoder::EncodedFields;
use crate::midi::{MidiMessage, SYSEX_BEGIN, SYSEX_END};
use serde::Deserialize;

pub const DEFAULT_DEVICE_ID: u8 = 0x7A;
pub const DEFAULT_NOTE_CHANNEL: u8 = 11;

pub const NOTE_BPM_WHOLE: u8 = 0x34;
pub const NOTE_BPM_FRACTIONAL: u8 = 0x35;
pub const NOTE_PHASE: u8 = 0x32;

/// Selects a variant in configuration files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolKind {
    #[default]
    Sysex,
    Notes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireProtocol {
    SysEx { device_id: u8 },
    Notes { channel: u8 },
}

impl Default for WireProtocol {
    fn default() -> Self {
        WireProtocol::SysEx {
            device_id: DEFAULT_DEVICE_ID,
        }
    }
}

impl WireProtocol {
    pub fn from_kind(kind: ProtocolKind, device_id: u8, channel: u8) -> Self {
        match kind {
            ProtocolKind::Sysex => WireProtocol::SysEx { device_id },
            ProtocolKind::Notes => WireProtocol::Notes { channel },
        }
    }

    /// Messages carrying tempo and phase for one tick
    pub fn active(&self, fields: &EncodedFields) -> Vec<MidiMessage> {
        match *self {
            WireProtocol::SysEx { device_id } => vec![sysex_frame(
                device_id,
                fields.bpm_whole,
                fields.bpm_fractional,
                fields.phase,
            )],
            WireProtocol::Notes { channel } => vec![
                MidiMessage::NoteOn {
                    channel,
                    note: NOTE_BPM_WHOLE,
                    velocity: fields.bpm_whole,
                },
                MidiMessage::NoteOn {
                    channel,
                    note: NOTE_BPM_FRACTIONAL,
                    velocity: fields.bpm_fractional,
                },
                MidiMessage::NoteOn {
                    channel,
                    note: NOTE_PHASE,
                    velocity: fields.phase,
                },
            ],
        }
    }

    /// The "no clock source" signal
    pub fn idle(&self) -> Vec<MidiMessage> {
        match *self {
            WireProtocol::SysEx { device_id } => vec![sysex_frame(device_id, 0, 0, 0)],
            WireProtocol::Notes { channel } => vec![MidiMessage::NoteOff {
                channel,
                note: NOTE_PHASE,
                velocity: 0,
            }],
        }
    }
}

fn sysex_frame(device_id: u8, bpm_whole: u8, bpm_fractional: u8, phase: u8) -> MidiMessage {
    MidiMessage::SysEx(vec![
        SYSEX_BEGIN,
        device_id & 0x7F,
        bpm_whole & 0x7F,
        bpm_fractional & 0x7F,
        phase & 0x7F,
        SYSEX_END,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;

    fn bytes(messages: &[MidiMessage]) -> Vec<Vec<u8>> {
        messages.iter().map(MidiMessage::to_bytes).collect()
    }

    #[test]
    fn test_sysex_active_frame() {
        let fields = encode(128.37, 0.5);
        let messages = WireProtocol::default().active(&fields);
        assert_eq!(bytes(&messages), vec![vec![0xF0, 0x7A, 68, 37, 64, 0xF7]]);
    }

    #[test]
    fn test_sysex_idle_frame() {
        let messages = WireProtocol::default().idle();
        assert_eq!(bytes(&messages), vec![vec![0xF0, 0x7A, 0, 0, 0, 0xF7]]);
    }

    #[test]
    fn test_notes_active_sequence() {
        let fields = encode(128.37, 0.5);
        let protocol = WireProtocol::Notes {
            channel: DEFAULT_NOTE_CHANNEL,
        };
        assert_eq!(
            bytes(&protocol.active(&fields)),
            vec![
                vec![0x9B, 0x34, 68],
                vec![0x9B, 0x35, 37],
                vec![0x9B, 0x32, 64],
            ]
        );
    }

    #[test]
    fn test_notes_idle_is_single_note_off() {
        let protocol = WireProtocol::Notes { channel: 3 };
        assert_eq!(bytes(&protocol.idle()), vec![vec![0x83, 0x32, 0]]);
    }

    #[test]
    fn test_from_kind() {
        assert_eq!(
            WireProtocol::from_kind(ProtocolKind::Notes, 0x7A, 5),
            WireProtocol::Notes { channel: 5 }
        );
        assert_eq!(
            WireProtocol::from_kind(ProtocolKind::Sysex, 0x10, 5),
            WireProtocol::SysEx { device_id: 0x10 }
        );
    }
}
