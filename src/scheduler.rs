use crossbeam::channel;
use log::{debug, warn};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Work run on every timer tick
pub type TimerTask = Box<dyn FnMut() + Send + 'static>;

/// Recurring timer provider. Ticks of one timer never overlap.
pub trait Scheduler {
    fn begin_timer(&self, interval: Duration, task: TimerTask) -> TimerHandle;
}

/// Owning handle of a running timer.
///
/// Stopping (or dropping) the handle returns only once the task can no
/// longer run.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        TimerHandle {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn stop(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

/// Runs each timer on its own thread
pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        ThreadScheduler
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ThreadScheduler {
    fn begin_timer(&self, interval: Duration, mut task: TimerTask) -> TimerHandle {
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let ticker = channel::tick(interval);

        let handle: JoinHandle<()> = thread::spawn(move || {
            debug!("Timer thread started ({:?} interval)", interval);
            loop {
                crossbeam::select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticker) -> _ => task(),
                }
            }
            debug!("Timer thread stopped");
        });

        TimerHandle::new(move || {
            drop(stop_tx);
            if handle.join().is_err() {
                warn!("Timer thread panicked");
            }
        })
    }
}

type ManualTimers = Arc<Mutex<Vec<(u64, TimerTask)>>>;

/// Scheduler whose timers only fire when [`ManualScheduler::fire`] is called.
///
/// Useful wherever ticks must be deterministic, e.g. in tests.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: ManualTimers,
    next_id: Arc<Mutex<u64>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one tick of every active timer
    pub fn fire(&self) {
        if let Ok(mut timers) = self.timers.lock() {
            for (_, task) in timers.iter_mut() {
                task();
            }
        }
    }

    pub fn active_timers(&self) -> usize {
        self.timers.lock().map(|t| t.len()).unwrap_or(0)
    }
}

impl Scheduler for ManualScheduler {
    fn begin_timer(&self, _interval: Duration, task: TimerTask) -> TimerHandle {
        let id = match self.next_id.lock() {
            Ok(mut next) => {
                *next += 1;
                *next
            }
            Err(_) => 0,
        };
        if let Ok(mut timers) = self.timers.lock() {
            timers.push((id, task));
        }

        let timers = Arc::clone(&self.timers);
        TimerHandle::new(move || {
            if let Ok(mut timers) = timers.lock() {
                timers.retain(|(timer_id, _)| *timer_id != id);
            }
        })
    }
}
