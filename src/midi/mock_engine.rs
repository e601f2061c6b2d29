use crate::midi::{MidiEngine, MidiError, MidiMessage, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Output engine that keeps every transmitted message in memory.
///
/// Clones share the same log, so a test can hand one clone to the clock and
/// inspect the other.
#[derive(Clone, Default)]
pub struct MockMidiEngine {
    sent: Arc<Mutex<Vec<MidiMessage>>>,
    disconnected: Arc<AtomicBool>,
}

impl MockMidiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MidiMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }

    /// Makes every following send fail, as an unplugged device would
    pub fn set_disconnected(&self, disconnected: bool) {
        self.disconnected.store(disconnected, Ordering::SeqCst);
    }
}

impl MidiEngine for MockMidiEngine {
    fn send(&mut self, msg: &MidiMessage) -> Result<()> {
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(MidiError::SendError("device disconnected".to_string()));
        }
        self.sent
            .lock()
            .map_err(|_| MidiError::SendError("mock log poisoned".to_string()))?
            .push(msg.clone());
        Ok(())
    }
}
