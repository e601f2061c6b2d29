// clock.rs

use crate::broadcaster::{Broadcaster, BroadcasterState, TickReport};
use crate::cache::{build_cache, DeckSource};
use crate::config::Settings;
use crate::error::Result;
use crate::host::DeckHost;
use crate::midi::MidiEngine;
use crate::protocol::WireProtocol;
use crate::scheduler::Scheduler;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

/// Context object driving the clock hardware for the whole process.
///
/// Construct it once, call [`DeckClock::init`] to start broadcasting and
/// [`DeckClock::shutdown`] to stop. A clock dropped while running shuts
/// itself down so the hardware never keeps free-running.
pub struct DeckClock<S: Scheduler> {
    scheduler: S,
    broadcaster: Broadcaster,
}

impl<S: Scheduler> DeckClock<S> {
    pub fn new(
        source: Box<dyn DeckSource>,
        protocol: WireProtocol,
        engine: impl MidiEngine + 'static,
        scheduler: S,
        interval: Duration,
    ) -> Self {
        DeckClock {
            scheduler,
            broadcaster: Broadcaster::new(source, protocol, Box::new(engine), interval),
        }
    }

    /// Builds the cache, protocol and timing described by `settings`
    pub fn from_settings(
        settings: &Settings,
        host: Arc<dyn DeckHost>,
        engine: impl MidiEngine + 'static,
        scheduler: S,
    ) -> Result<Self> {
        settings.validate()?;
        let source = build_cache(settings.cache_mode, host, settings.channel_list())?;
        info!(
            "Clock configured: {:?} protocol, {:?} cache, {} channels",
            settings.wire_protocol(),
            settings.cache_mode,
            settings.channels.len()
        );
        Ok(Self::new(
            source,
            settings.wire_protocol(),
            engine,
            scheduler,
            settings.interval(),
        ))
    }

    /// Starts the periodic broadcast. Fails with `AlreadyRunning` if called
    /// twice without an intervening shutdown.
    pub fn init(&mut self) -> Result<()> {
        self.broadcaster.start(&self.scheduler)?;
        info!("DeckClock initialized");
        Ok(())
    }

    /// Stops the periodic broadcast and sends the final idle message
    pub fn shutdown(&mut self) -> Result<()> {
        self.broadcaster.stop()?;
        info!("DeckClock shut down");
        Ok(())
    }

    pub fn state(&self) -> BroadcasterState {
        self.broadcaster.state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == BroadcasterState::Running
    }

    pub fn last_report(&self) -> Option<TickReport> {
        self.broadcaster.last_report()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

impl<S: Scheduler> Drop for DeckClock<S> {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.shutdown() {
                error!("Shutdown on drop failed: {}", e);
            }
        }
    }
}
