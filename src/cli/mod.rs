use crate::config::Settings;
use crate::error::{ClockError, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    Sysex,
    Notes,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Drives MIDI clock hardware from the sync leader deck", long_about = None)]
pub struct Args {
    /// List available MIDI output devices
    #[arg(long)]
    pub device_list: bool,

    /// MIDI output device (substring of the port name)
    #[arg(long)]
    pub output: Option<String>,

    /// Configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Wire protocol sent to the clock hardware
    #[arg(long, value_enum)]
    pub protocol: Option<ProtocolArg>,

    /// MIDI channel index (0-15) for the notes protocol
    #[arg(long)]
    pub note_channel: Option<u8>,

    /// Tick interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Simulate a playing sync leader at this tempo on the first channel
    #[arg(long)]
    pub simulate_bpm: Option<f64>,
}

impl Args {
    /// Command-line values win over file and environment settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(output) = &self.output {
            settings.output_device = Some(output.clone());
        }
        if let Some(protocol) = self.protocol {
            settings.protocol = match protocol {
                ProtocolArg::Sysex => crate::protocol::ProtocolKind::Sysex,
                ProtocolArg::Notes => crate::protocol::ProtocolKind::Notes,
            };
        }
        if let Some(channel) = self.note_channel {
            settings.note_channel = channel;
        }
        if let Some(interval_ms) = self.interval_ms {
            settings.interval_ms = interval_ms;
        }
    }

    /// Requested simulation tempo; it must be a finite, positive BPM
    pub fn simulation_bpm(&self) -> Result<Option<f64>> {
        match self.simulate_bpm {
            Some(bpm) if !bpm.is_finite() || bpm <= 0.0 => Err(ClockError::InvalidConfig(
                format!("--simulate-bpm must be a positive tempo, got {}", bpm),
            )),
            other => Ok(other),
        }
    }
}

pub fn validate_device(device_name: &str, devices: &[String]) -> std::result::Result<(), String> {
    if !devices.iter().any(|d| d.contains(device_name)) {
        let mut error_msg = format!(
            "Error: Device '{}' not found in available devices:\n",
            device_name
        );
        for device in devices {
            error_msg.push_str(&format!("  - {}\n", device));
        }
        return Err(error_msg);
    }
    Ok(())
}
