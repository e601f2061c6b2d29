//! Inbound attribute interface of the host mixing application
//!
//! The host exposes named numeric controls per deck group. Values can be read
//! on demand or observed through change callbacks. [`InMemoryHost`] is a
//! complete in-process implementation used by the simulation mode and tests.

use crate::deck::{Channel, DeckAttribute, DeckState};
use crate::error::Result;
use log::trace;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Invoked with the new value every time a subscribed control changes
pub type ControlCallback = Box<dyn Fn(f64) + Send + Sync + 'static>;

type SharedCallback = Arc<dyn Fn(f64) + Send + Sync + 'static>;

pub trait DeckHost: Send + Sync {
    /// Current value of `key` on `group`, `None` if the host has none yet
    fn get_value(&self, group: &str, key: &str) -> Option<f64>;

    /// Registers `callback` for changes of `key` on `group`. The
    /// subscription lasts until the returned handle is dropped.
    fn connect(&self, group: &str, key: &str, callback: ControlCallback) -> Result<Subscription>;
}

/// Live change subscription; disconnects when dropped
pub struct Subscription {
    disconnect: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(disconnect: impl FnOnce() + Send + 'static) -> Self {
        Subscription {
            disconnect: Some(Box::new(disconnect)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

type ControlKey = (String, String);

#[derive(Default)]
struct HostInner {
    values: HashMap<ControlKey, f64>,
    subscribers: HashMap<ControlKey, Vec<(u64, SharedCallback)>>,
    next_id: u64,
}

/// Thread-safe host living entirely in memory.
///
/// Clones share state, so one clone can be handed to the clock while another
/// plays the role of the mixing engine.
#[derive(Clone, Default)]
pub struct InMemoryHost {
    inner: Arc<Mutex<HostInner>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value and notifies subscribers if it changed
    pub fn set_value(&self, group: &str, key: &str, value: f64) {
        let control = (group.to_string(), key.to_string());
        let callbacks: Vec<SharedCallback> = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(poisoned) => poisoned.into_inner(),
            };
            let previous = inner.values.insert(control.clone(), value);
            if previous == Some(value) {
                return;
            }
            inner
                .subscribers
                .get(&control)
                .map(|subs| subs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };

        trace!("{}/{} = {} ({} subscribers)", group, key, value, callbacks.len());
        for callback in callbacks {
            callback(value);
        }
    }

    pub fn set_attribute(&self, channel: &Channel, attribute: DeckAttribute, value: f64) {
        self.set_value(channel.group(), attribute.key(), value);
    }

    /// Writes all four attributes of a deck
    pub fn set_deck(&self, channel: &Channel, state: DeckState) {
        self.set_attribute(channel, DeckAttribute::Bpm, state.bpm);
        self.set_attribute(channel, DeckAttribute::SyncMode, state.sync_mode.as_value());
        self.set_attribute(channel, DeckAttribute::BeatDistance, state.beat_distance);
        self.set_attribute(
            channel,
            DeckAttribute::PlayLatched,
            if state.playing { 1.0 } else { 0.0 },
        );
    }

    /// Number of live subscriptions on one control
    pub fn subscription_count(&self, group: &str, key: &str) -> usize {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| {
                inner
                    .subscribers
                    .get(&(group.to_string(), key.to_string()))
                    .map(Vec::len)
            })
            .unwrap_or(0)
    }

    pub fn total_subscriptions(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.subscribers.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

impl DeckHost for InMemoryHost {
    fn get_value(&self, group: &str, key: &str) -> Option<f64> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.values.get(&(group.to_string(), key.to_string())).copied())
    }

    fn connect(&self, group: &str, key: &str, callback: ControlCallback) -> Result<Subscription> {
        let control = (group.to_string(), key.to_string());
        let id = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(poisoned) => poisoned.into_inner(),
            };
            let id = inner.next_id;
            inner.next_id += 1;
            inner
                .subscribers
                .entry(control.clone())
                .or_default()
                .push((id, Arc::from(callback)));
            id
        };

        let weak: Weak<Mutex<HostInner>> = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                if let Ok(mut inner) = inner.lock() {
                    if let Some(subs) = inner.subscribers.get_mut(&control) {
                        subs.retain(|(sub_id, _)| *sub_id != id);
                        if subs.is_empty() {
                            inner.subscribers.remove(&control);
                        }
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_missing_value_is_none() {
        let host = InMemoryHost::new();
        assert_eq!(host.get_value("[Channel1]", "bpm"), None);
        host.set_value("[Channel1]", "bpm", 120.0);
        assert_eq!(host.get_value("[Channel1]", "bpm"), Some(120.0));
    }

    #[test]
    fn test_callbacks_fire_only_on_change() {
        let host = InMemoryHost::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let _sub = host
            .connect(
                "[Channel1]",
                "bpm",
                Box::new(move |_: f64| {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        host.set_value("[Channel1]", "bpm", 120.0);
        host.set_value("[Channel1]", "bpm", 120.0);
        host.set_value("[Channel1]", "bpm", 121.0);
        host.set_value("[Channel2]", "bpm", 99.0);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropping_subscription_disconnects() {
        let host = InMemoryHost::new();
        let sub = host
            .connect("[Channel1]", "play_latched", Box::new(|_: f64| {}))
            .unwrap();
        assert_eq!(host.subscription_count("[Channel1]", "play_latched"), 1);

        drop(sub);
        assert_eq!(host.subscription_count("[Channel1]", "play_latched"), 0);
        assert_eq!(host.total_subscriptions(), 0);
    }
}
