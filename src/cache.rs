//! Deck state cache
//!
//! Two strategies keep the per-channel [`DeckState`] current:
//! - [`PullCache`] queries the host for every attribute on each snapshot.
//! - [`PushCache`] subscribes once per (channel, attribute) and keeps the
//!   latest notified value in a single-slot mailbox per field.
//!
//! Neither strategy blocks or fails on read; a value the host never provided
//! reads as the [`DeckState`] default.

use crate::deck::{
    decode_beat_distance, decode_bpm, decode_playing, Channel, DeckAttribute, DeckState, SyncMode,
};
use crate::error::Result;
use crate::host::{DeckHost, Subscription};
use log::{debug, info};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Which update strategy the cache uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    Pull,
    #[default]
    Push,
}

/// Source of per-channel deck state, in channel order
pub trait DeckSource: Send {
    fn channels(&self) -> &[Channel];
    fn snapshot(&self) -> Vec<DeckState>;
}

/// Re-reads all four attributes from the host on every snapshot
pub struct PullCache {
    host: Arc<dyn DeckHost>,
    channels: Vec<Channel>,
}

impl PullCache {
    pub fn new(host: Arc<dyn DeckHost>, channels: Vec<Channel>) -> Self {
        debug!("Pull cache reading {} channels", channels.len());
        PullCache { host, channels }
    }

    fn read(&self, channel: &Channel) -> DeckState {
        let mut state = DeckState::default();
        for attribute in DeckAttribute::ALL {
            if let Some(value) = self.host.get_value(channel.group(), attribute.key()) {
                state.apply(attribute, value);
            }
        }
        state
    }
}

impl DeckSource for PullCache {
    fn channels(&self) -> &[Channel] {
        &self.channels
    }

    fn snapshot(&self) -> Vec<DeckState> {
        self.channels.iter().map(|c| self.read(c)).collect()
    }
}

/// Marks a field no value has been written to yet. Decoded values are
/// always finite, so the NaN bit pattern never collides with real data.
const UNSET_F64: u64 = u64::MAX;
const UNSET_U8: u8 = u8::MAX;

/// Latest-value mailbox for one deck. Each field has a single writer, the
/// host callback for that attribute; the registration-time seed only fills a
/// field the callback has not written yet.
#[derive(Debug)]
struct DeckSlot {
    bpm: AtomicU64,
    sync_mode: AtomicU8,
    beat_distance: AtomicU64,
    playing: AtomicU8,
}

impl Default for DeckSlot {
    fn default() -> Self {
        DeckSlot {
            bpm: AtomicU64::new(UNSET_F64),
            sync_mode: AtomicU8::new(UNSET_U8),
            beat_distance: AtomicU64::new(UNSET_F64),
            playing: AtomicU8::new(UNSET_U8),
        }
    }
}

impl DeckSlot {
    fn field(&self, attribute: DeckAttribute) -> Field<'_> {
        match attribute {
            DeckAttribute::Bpm => Field::Wide(&self.bpm),
            DeckAttribute::SyncMode => Field::Narrow(&self.sync_mode),
            DeckAttribute::BeatDistance => Field::Wide(&self.beat_distance),
            DeckAttribute::PlayLatched => Field::Narrow(&self.playing),
        }
    }

    /// Notification path: always overwrites
    fn store(&self, attribute: DeckAttribute, value: f64) {
        match self.field(attribute) {
            Field::Wide(cell) => cell.store(encode_wide(attribute, value), Ordering::Release),
            Field::Narrow(cell) => cell.store(encode_narrow(attribute, value), Ordering::Release),
        }
    }

    /// Seed path: loses against any notification that already landed
    fn seed(&self, attribute: DeckAttribute, value: f64) {
        let seeded = match self.field(attribute) {
            Field::Wide(cell) => cell
                .compare_exchange(
                    UNSET_F64,
                    encode_wide(attribute, value),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok(),
            Field::Narrow(cell) => cell
                .compare_exchange(
                    UNSET_U8,
                    encode_narrow(attribute, value),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok(),
        };
        if !seeded {
            debug!("{} changed during registration; keeping notified value", attribute.key());
        }
    }

    fn load(&self) -> DeckState {
        let wide = |cell: &AtomicU64| match cell.load(Ordering::Acquire) {
            UNSET_F64 => 0.0,
            bits => f64::from_bits(bits),
        };
        let sync_mode = match self.sync_mode.load(Ordering::Acquire) {
            UNSET_U8 => SyncMode::default(),
            code => SyncMode::from_code(code),
        };

        DeckState {
            bpm: wide(&self.bpm),
            sync_mode,
            beat_distance: wide(&self.beat_distance),
            playing: self.playing.load(Ordering::Acquire) == 1,
        }
    }
}

enum Field<'a> {
    Wide(&'a AtomicU64),
    Narrow(&'a AtomicU8),
}

fn encode_wide(attribute: DeckAttribute, value: f64) -> u64 {
    match attribute {
        DeckAttribute::BeatDistance => decode_beat_distance(value).to_bits(),
        _ => decode_bpm(value).to_bits(),
    }
}

fn encode_narrow(attribute: DeckAttribute, value: f64) -> u8 {
    match attribute {
        DeckAttribute::PlayLatched => u8::from(decode_playing(value)),
        _ => SyncMode::from_value(value).code(),
    }
}

/// Mirrors host state through change notifications.
///
/// Subscriptions are registered exactly once, in [`PushCache::new`], and are
/// released when the cache is dropped.
pub struct PushCache {
    channels: Vec<Channel>,
    slots: Vec<Arc<DeckSlot>>,
    _subscriptions: Vec<Subscription>,
}

impl PushCache {
    pub fn new(host: &dyn DeckHost, channels: Vec<Channel>) -> Result<Self> {
        let mut slots = Vec::with_capacity(channels.len());
        let mut subscriptions = Vec::with_capacity(channels.len() * DeckAttribute::ALL.len());

        for channel in &channels {
            let slot = Arc::new(DeckSlot::default());
            for attribute in DeckAttribute::ALL {
                // Subscribe before reading so no change can fall between the two
                let target = Arc::clone(&slot);
                let subscription = host.connect(
                    channel.group(),
                    attribute.key(),
                    Box::new(move |value: f64| target.store(attribute, value)),
                )?;
                subscriptions.push(subscription);

                if let Some(value) = host.get_value(channel.group(), attribute.key()) {
                    slot.seed(attribute, value);
                }
            }
            slots.push(slot);
        }

        info!(
            "Push cache subscribed to {} controls on {} channels",
            subscriptions.len(),
            channels.len()
        );

        Ok(PushCache {
            channels,
            slots,
            _subscriptions: subscriptions,
        })
    }
}

impl DeckSource for PushCache {
    fn channels(&self) -> &[Channel] {
        &self.channels
    }

    fn snapshot(&self) -> Vec<DeckState> {
        self.slots.iter().map(|slot| slot.load()).collect()
    }
}

/// Builds the cache for the configured strategy
pub fn build_cache(
    mode: CacheMode,
    host: Arc<dyn DeckHost>,
    channels: Vec<Channel>,
) -> Result<Box<dyn DeckSource>> {
    match mode {
        CacheMode::Pull => Ok(Box::new(PullCache::new(host, channels))),
        CacheMode::Push => Ok(Box::new(PushCache::new(host.as_ref(), channels)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::default_channels;
    use crate::host::{ControlCallback, InMemoryHost};
    use std::sync::atomic::AtomicBool;

    fn leader() -> DeckState {
        DeckState {
            bpm: 124.5,
            sync_mode: SyncMode::Leader,
            beat_distance: 0.75,
            playing: true,
        }
    }

    #[test]
    fn test_pull_cache_reads_defaults_for_missing_values() {
        let host = InMemoryHost::new();
        let cache = PullCache::new(Arc::new(host), default_channels());
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.iter().all(|s| *s == DeckState::default()));
    }

    #[test]
    fn test_pull_cache_sees_host_changes_immediately() {
        let host = InMemoryHost::new();
        let channels = default_channels();
        let cache = PullCache::new(Arc::new(host.clone()), channels.clone());

        host.set_deck(&channels[2], leader());
        assert_eq!(cache.snapshot()[2], leader());
        assert_eq!(host.total_subscriptions(), 0);
    }

    #[test]
    fn test_push_cache_seeds_from_current_values() {
        let host = InMemoryHost::new();
        let channels = default_channels();
        host.set_deck(&channels[0], leader());

        let cache = PushCache::new(&host, channels).unwrap();
        assert_eq!(cache.snapshot()[0], leader());
    }

    #[test]
    fn test_push_cache_follows_notifications() {
        let host = InMemoryHost::new();
        let channels = default_channels();
        let cache = PushCache::new(&host, channels.clone()).unwrap();

        host.set_deck(&channels[1], leader());
        assert_eq!(cache.snapshot()[1], leader());

        host.set_attribute(&channels[1], DeckAttribute::PlayLatched, 0.0);
        assert!(!cache.snapshot()[1].playing);
        assert_eq!(cache.snapshot()[0], DeckState::default());
    }

    /// Host whose deck starts playing while the cache reads `play_latched`
    struct StartsPlayingOnRead {
        inner: InMemoryHost,
        started: AtomicBool,
    }

    impl DeckHost for StartsPlayingOnRead {
        fn get_value(&self, group: &str, key: &str) -> Option<f64> {
            let value = self.inner.get_value(group, key);
            if key == DeckAttribute::PlayLatched.key() && !self.started.swap(true, Ordering::SeqCst)
            {
                self.inner.set_value(group, key, 1.0);
            }
            value
        }

        fn connect(
            &self,
            group: &str,
            key: &str,
            callback: ControlCallback,
        ) -> Result<Subscription> {
            self.inner.connect(group, key, callback)
        }
    }

    #[test]
    fn test_push_cache_keeps_change_made_during_registration() {
        let inner = InMemoryHost::new();
        let channels = default_channels();
        inner.set_deck(
            &channels[0],
            DeckState {
                playing: false,
                ..leader()
            },
        );
        let host = StartsPlayingOnRead {
            inner: inner.clone(),
            started: AtomicBool::new(false),
        };

        let cache = PushCache::new(&host, channels).unwrap();

        assert_eq!(inner.get_value("[Channel1]", "play_latched"), Some(1.0));
        assert!(cache.snapshot()[0].playing);
        assert_eq!(cache.snapshot()[0], leader());
    }

    #[test]
    fn test_push_cache_subscribes_once_per_control() {
        let host = InMemoryHost::new();
        let channels = default_channels();
        let cache = PushCache::new(&host, channels.clone()).unwrap();

        for channel in &channels {
            for attribute in DeckAttribute::ALL {
                assert_eq!(host.subscription_count(channel.group(), attribute.key()), 1);
            }
        }
        assert_eq!(host.total_subscriptions(), 16);

        drop(cache);
        assert_eq!(host.total_subscriptions(), 0);
    }
}
