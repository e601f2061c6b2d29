//! Periodic broadcaster
//!
//! On every tick the deck cache is sampled, a clock source is resolved and
//! either an active (tempo + phase) payload or the idle payload is written to
//! the MIDI engine. Stopping cancels the timer first and then sends one final
//! idle payload, so nothing can follow it on the wire.

use crate::cache::DeckSource;
use crate::encoder::{encode, EncodedFields, TempoRange, MAX_BPM, MIN_BPM};
use crate::error::{ClockError, Result};
use crate::midi::{self, MidiEngine, MidiMessage};
use crate::protocol::WireProtocol;
use crate::resolver::{resolve, ClockSelection};
use crate::scheduler::{Scheduler, TimerHandle};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Reference tick interval of the clock hardware
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(375);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcasterState {
    Stopped,
    Running,
}

/// What a tick (or the shutdown) put on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum TickReport {
    Active {
        selection: ClockSelection,
        fields: EncodedFields,
    },
    Idle,
    /// The payload could not be delivered; holds the engine's error text
    SendFailed(String),
}

struct TickCore {
    source: Box<dyn DeckSource>,
    protocol: WireProtocol,
    engine: Box<dyn MidiEngine>,
    last_range: TempoRange,
    last_report: Option<TickReport>,
}

impl TickCore {
    fn tick(&mut self) -> midi::Result<TickReport> {
        let decks = self.source.snapshot();
        let report = match resolve(&decks) {
            Some(selection) => {
                let fields = encode(selection.bpm, selection.beat_distance);
                self.track_range(&selection, fields.range);
                TickReport::Active { selection, fields }
            }
            None => TickReport::Idle,
        };

        let messages = match &report {
            TickReport::Active { fields, .. } => self.protocol.active(fields),
            _ => self.protocol.idle(),
        };
        self.deliver(&messages, report)
    }

    fn send_idle(&mut self) -> midi::Result<TickReport> {
        let messages = self.protocol.idle();
        self.deliver(&messages, TickReport::Idle)
    }

    /// Records `report` only once every message is out
    fn deliver(
        &mut self,
        messages: &[MidiMessage],
        report: TickReport,
    ) -> midi::Result<TickReport> {
        match self.transmit(messages) {
            Ok(()) => {
                self.last_report = Some(report.clone());
                Ok(report)
            }
            Err(e) => {
                self.last_report = Some(TickReport::SendFailed(e.to_string()));
                Err(e)
            }
        }
    }

    fn transmit(&mut self, messages: &[MidiMessage]) -> midi::Result<()> {
        for message in messages {
            debug!("Transmitting {:02X?}", message.to_bytes());
            self.engine.send(message)?;
        }
        Ok(())
    }

    /// Logs when the tempo leaves or re-enters the encodable window
    fn track_range(&mut self, selection: &ClockSelection, range: TempoRange) {
        if range == self.last_range {
            return;
        }
        let channel = self
            .source
            .channels()
            .get(selection.tempo_source)
            .map(|c| c.to_string())
            .unwrap_or_default();
        match range {
            TempoRange::BelowRange => warn!(
                "{} tempo {:.2} BPM is below {} BPM; clock reports {} BPM",
                channel, selection.bpm, MIN_BPM, MIN_BPM
            ),
            TempoRange::AboveRange => warn!(
                "{} tempo {:.2} BPM is above {} BPM; clock reports {} BPM",
                channel, selection.bpm, MAX_BPM, MAX_BPM
            ),
            TempoRange::InRange => info!(
                "{} tempo {:.2} BPM is back inside the clock range",
                channel, selection.bpm
            ),
        }
        self.last_range = range;
    }
}

fn lock(core: &Mutex<TickCore>) -> MutexGuard<'_, TickCore> {
    match core.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub struct Broadcaster {
    core: Arc<Mutex<TickCore>>,
    interval: Duration,
    timer: Option<TimerHandle>,
}

impl Broadcaster {
    pub fn new(
        source: Box<dyn DeckSource>,
        protocol: WireProtocol,
        engine: Box<dyn MidiEngine>,
        interval: Duration,
    ) -> Self {
        Broadcaster {
            core: Arc::new(Mutex::new(TickCore {
                source,
                protocol,
                engine,
                last_range: TempoRange::InRange,
                last_report: None,
            })),
            interval,
            timer: None,
        }
    }

    pub fn state(&self) -> BroadcasterState {
        if self.timer.is_some() {
            BroadcasterState::Running
        } else {
            BroadcasterState::Stopped
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Schedules the recurring tick and returns immediately. The first tick
    /// fires one interval later.
    pub fn start(&mut self, scheduler: &dyn Scheduler) -> Result<()> {
        if self.timer.is_some() {
            return Err(ClockError::AlreadyRunning);
        }

        let core = Arc::clone(&self.core);
        let timer = scheduler.begin_timer(
            self.interval,
            Box::new(move || {
                if let Err(e) = lock(&core).tick() {
                    error!("Failed to transmit clock message: {}", e);
                }
            }),
        );
        self.timer = Some(timer);
        info!("Broadcaster running every {:?}", self.interval);
        Ok(())
    }

    /// Cancels the timer, then sends the final idle payload
    pub fn stop(&mut self) -> Result<()> {
        let timer = self.timer.take().ok_or(ClockError::NotRunning)?;
        // The core lock must not be held here: stopping waits for an
        // in-flight tick to finish.
        timer.stop();

        lock(&self.core).send_idle()?;
        info!("Broadcaster stopped, idle message sent");
        Ok(())
    }

    /// Runs one tick on the caller's thread
    pub fn tick(&self) -> Result<TickReport> {
        Ok(lock(&self.core).tick()?)
    }

    pub fn last_report(&self) -> Option<TickReport> {
        lock(&self.core).last_report.clone()
    }
}
