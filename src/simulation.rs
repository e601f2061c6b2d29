//! Simulated host deck
//!
//! Plays one deck of an [`InMemoryHost`] as a running sync leader at a fixed
//! tempo so the clock hardware can be exercised without the mixing
//! application.

use crate::deck::{Channel, DeckAttribute, DeckState, SyncMode};
use crate::host::InMemoryHost;
use log::info;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const UPDATE_INTERVAL: Duration = Duration::from_millis(10);

/// Advances `beat_distance` of the simulated deck in real time
pub struct DeckSimulation {
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl DeckSimulation {
    pub fn start(host: InMemoryHost, channel: Channel, bpm: f64) -> Self {
        host.set_deck(
            &channel,
            DeckState {
                bpm,
                sync_mode: SyncMode::Leader,
                beat_distance: 0.0,
                playing: true,
            },
        );

        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let beat_length = Duration::from_secs_f64(60.0 / bpm.max(1.0));
        info!("Simulating {} as leader at {:.2} BPM", channel, bpm);

        let thread_handle = thread::spawn(move || {
            let start = Instant::now();
            while thread_running.load(Ordering::SeqCst) {
                let beats = start.elapsed().as_secs_f64() / beat_length.as_secs_f64();
                host.set_attribute(&channel, DeckAttribute::BeatDistance, beats.fract());
                thread::sleep(UPDATE_INTERVAL);
            }
            host.set_attribute(&channel, DeckAttribute::PlayLatched, 0.0);
        });

        DeckSimulation {
            running,
            thread_handle: Some(thread_handle),
        }
    }

    /// Stops the deck; it is left paused, still as leader
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DeckSimulation {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DeckHost;

    #[test]
    fn test_simulation_drives_leader_deck() {
        let host = InMemoryHost::new();
        let channel = Channel::numbered(1);
        let mut simulation = DeckSimulation::start(host.clone(), channel.clone(), 128.0);

        assert_eq!(host.get_value("[Channel1]", "sync_mode"), Some(2.0));
        assert_eq!(host.get_value("[Channel1]", "bpm"), Some(128.0));

        thread::sleep(Duration::from_millis(50));
        let beat_distance = host.get_value("[Channel1]", "beat_distance").unwrap();
        assert!(beat_distance > 0.0 && beat_distance < 1.0);

        simulation.stop();
        assert_eq!(host.get_value("[Channel1]", "play_latched"), Some(0.0));
    }
}
