//! Deck model mirrored from the host mixing application
//!
//! Each deck ("channel" in host terms) exposes four numeric attributes. The
//! host hands them over as plain floats; this module turns them into typed
//! values and guarantees the safe defaults used whenever a value is missing.

use std::fmt;

/// Identifier of an independent playback path, e.g. `[Channel1]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Channel(String);

impl Channel {
    pub fn new(group: impl Into<String>) -> Self {
        Channel(group.into())
    }

    /// Host-style group name for a 1-based deck number
    pub fn numbered(number: usize) -> Self {
        Channel(format!("[Channel{}]", number))
    }

    pub fn group(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The four standard decks of the host
pub fn default_channels() -> Vec<Channel> {
    (1..=4).map(Channel::numbered).collect()
}

/// Role of a deck in host-side synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    #[default]
    Disabled,
    Follower,
    Leader,
}

impl SyncMode {
    /// Decodes the host's `sync_mode` value (0, 1 or 2). Anything else is
    /// treated as disabled.
    pub fn from_value(value: f64) -> Self {
        let rounded = value.round();
        if (0.0..=f64::from(u8::MAX)).contains(&rounded) {
            Self::from_code(rounded as u8)
        } else {
            SyncMode::Disabled
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => SyncMode::Follower,
            2 => SyncMode::Leader,
            _ => SyncMode::Disabled,
        }
    }

    /// Host-side numeric code: 0 disabled, 1 follower, 2 leader
    pub fn code(self) -> u8 {
        match self {
            SyncMode::Disabled => 0,
            SyncMode::Follower => 1,
            SyncMode::Leader => 2,
        }
    }

    pub fn as_value(self) -> f64 {
        f64::from(self.code())
    }
}

/// Observable attributes of a deck, keyed by the host's control names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeckAttribute {
    Bpm,
    SyncMode,
    BeatDistance,
    PlayLatched,
}

impl DeckAttribute {
    pub const ALL: [DeckAttribute; 4] = [
        DeckAttribute::Bpm,
        DeckAttribute::SyncMode,
        DeckAttribute::BeatDistance,
        DeckAttribute::PlayLatched,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DeckAttribute::Bpm => "bpm",
            DeckAttribute::SyncMode => "sync_mode",
            DeckAttribute::BeatDistance => "beat_distance",
            DeckAttribute::PlayLatched => "play_latched",
        }
    }
}

/// Per-channel snapshot of the four observable attributes
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeckState {
    pub bpm: f64,
    pub sync_mode: SyncMode,
    /// Phase between the current and next beat marker, in [0, 1)
    pub beat_distance: f64,
    /// True only while actually playing, not while previewing or cueing
    pub playing: bool,
}

impl DeckState {
    pub fn is_leader(&self) -> bool {
        self.sync_mode == SyncMode::Leader
    }

    pub fn is_follower(&self) -> bool {
        self.sync_mode == SyncMode::Follower
    }

    /// Stores a raw host value into the matching field
    pub fn apply(&mut self, attribute: DeckAttribute, value: f64) {
        match attribute {
            DeckAttribute::Bpm => self.bpm = decode_bpm(value),
            DeckAttribute::SyncMode => self.sync_mode = SyncMode::from_value(value),
            DeckAttribute::BeatDistance => self.beat_distance = decode_beat_distance(value),
            DeckAttribute::PlayLatched => self.playing = decode_playing(value),
        }
    }
}

/// Tempo is never negative; garbage reads as a stopped deck.
pub fn decode_bpm(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Keeps the phase inside [0, 1)
pub fn decode_beat_distance(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        0.0
    } else if value >= 1.0 {
        value.fract()
    } else {
        value
    }
}

pub fn decode_playing(value: f64) -> bool {
    value.round() as i64 == 1
}
