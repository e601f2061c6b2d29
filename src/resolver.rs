//! Clock source selection
//!
//! Tempo always comes from the sync leader, even while it is paused. Phase
//! must come from a deck that is actually advancing, so when the leader is
//! stopped the phase is borrowed from a playing follower, or failing that
//! from any playing deck.

use crate::deck::DeckState;

/// The deck chosen as time source for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockSelection {
    /// Index of the deck supplying the tempo (always the leader)
    pub tempo_source: usize,
    /// Index of the deck supplying the phase
    pub phase_source: usize,
    pub bpm: f64,
    pub beat_distance: f64,
}

/// Picks the clock source by priority, first match wins.
///
/// When several decks claim leadership the first one in channel order is
/// used and the rest are ignored.
pub fn resolve(decks: &[DeckState]) -> Option<ClockSelection> {
    let (leader_index, leader) = decks.iter().enumerate().find(|(_, d)| d.is_leader())?;

    let phase_source = if leader.playing {
        leader_index
    } else {
        let playing_follower = decks.iter().position(|d| d.is_follower() && d.playing);
        let any_playing = decks.iter().position(|d| d.playing);
        playing_follower.or(any_playing)?
    };

    Some(ClockSelection {
        tempo_source: leader_index,
        phase_source,
        bpm: leader.bpm,
        beat_distance: decks[phase_source].beat_distance,
    })
}
