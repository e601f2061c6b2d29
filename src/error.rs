use crate::midi::MidiError;
use thiserror::Error;

/// Errors surfaced by the clock lifecycle, configuration and host wiring
#[derive(Debug, Error)]
pub enum ClockError {
    #[error(transparent)]
    Midi(#[from] MidiError),

    #[error("broadcaster is already running; call shutdown() first")]
    AlreadyRunning,

    #[error("broadcaster is not running")]
    NotRunning,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] ::config::ConfigError),

    #[error("logger initialization failed: {0}")]
    Logging(String),

    #[error("failed to install signal handler: {0}")]
    Signal(String),
}

pub type Result<T> = std::result::Result<T, ClockError>;
