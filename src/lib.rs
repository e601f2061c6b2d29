//! DeckClock
//!
//! Derives a tempo-and-phase signal from the sync leader deck of a
//! multi-deck mixing host and sends it to external MIDI clock hardware.
//!
//! Data flows one way on every tick:
//! [`cache`] snapshot → [`resolver::resolve`] → [`encoder::encode`] →
//! [`protocol::WireProtocol`] → [`midi::MidiEngine`].
//! [`clock::DeckClock`] owns the schedule and guarantees a final idle
//! message on shutdown.

pub mod broadcaster;
pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod deck;
pub mod encoder;
pub mod error;
pub mod host;
pub mod logging;
pub mod midi;
pub mod protocol;
pub mod resolver;
pub mod scheduler;
pub mod simulation;
pub mod ui;

pub use broadcaster::{Broadcaster, BroadcasterState, TickReport, DEFAULT_INTERVAL};
pub use cache::{CacheMode, DeckSource, PullCache, PushCache};
pub use cli::{validate_device, Args};
pub use clock::DeckClock;
pub use config::Settings;
pub use deck::{Channel, DeckAttribute, DeckState, SyncMode};
pub use encoder::{encode, EncodedFields, TempoRange};
pub use error::{ClockError, Result};
pub use host::{DeckHost, InMemoryHost, Subscription};
pub use protocol::WireProtocol;
pub use resolver::{resolve, ClockSelection};
pub use scheduler::{ManualScheduler, Scheduler, ThreadScheduler, TimerHandle};

pub fn handle_device_list() -> Vec<String> {
    midi::list_output_devices()
}
