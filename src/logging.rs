use crate::error::{ClockError, Result};
use simplelog::*;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

/// `$HOME/.local/share/deckclock/logs`
pub fn log_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| ClockError::Logging("HOME environment variable not set".to_string()))?;

    Ok(PathBuf::from(home)
        .join(".local")
        .join("share")
        .join("deckclock")
        .join("logs"))
}

/// Installs the file logger plus warnings on stderr. Fails if a logger is
/// already installed.
pub fn init_logger(level: LevelFilter) -> Result<()> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir).map_err(|e| ClockError::Logging(e.to_string()))?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("app.log"))
        .map_err(|e| ClockError::Logging(e.to_string()))?;

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .build();

    CombinedLogger::init(vec![
        WriteLogger::new(level, config.clone(), log_file),
        TermLogger::new(
            LevelFilter::Warn,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ),
    ])
    .map_err(|e| ClockError::Logging(e.to_string()))
}
