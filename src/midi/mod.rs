//! MIDI output for DeckClock
//!
//! This module provides the outbound transport:
//! - Core MIDI message types and error handling
//! - Real MIDI device output via midir
//! - A recording mock for tests
//!
//! The main components are:
//! - [`MidiEngine`] trait for sending MIDI messages
//! - [`MidirEngine`] for real MIDI device communication
//! - [`MockMidiEngine`] for testing
//!
mod engine;
pub mod midir_engine;
pub mod mock_engine;

pub use engine::{
    MidiEngine, MidiError, MidiMessage, Result, NOTE_OFF, NOTE_ON, SYSEX_BEGIN, SYSEX_END,
};

pub use midir_engine::{list_output_devices, MidirEngine};
pub use mock_engine::MockMidiEngine;

// Set default engine type
pub type DefaultMidiEngine = MidirEngine;
