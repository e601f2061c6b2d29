// config.rs

use crate::cache::CacheMode;
use crate::deck::Channel;
use crate::error::{ClockError, Result};
use crate::protocol::{ProtocolKind, WireProtocol, DEFAULT_DEVICE_ID, DEFAULT_NOTE_CHANNEL};
use ::config::{Config, Environment, File};
use log::LevelFilter;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "deckclock.toml";
pub const ENV_PREFIX: &str = "DECKCLOCK";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub interval_ms: u64,
    pub protocol: ProtocolKind,
    pub sysex_device_id: u8,
    pub note_channel: u8,
    pub channels: Vec<String>,
    pub cache_mode: CacheMode,
    pub output_device: Option<String>,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            interval_ms: 375,
            protocol: ProtocolKind::Sysex,
            sysex_device_id: DEFAULT_DEVICE_ID,
            note_channel: DEFAULT_NOTE_CHANNEL,
            channels: (1..=4).map(|n| Channel::numbered(n).to_string()).collect(),
            cache_mode: CacheMode::Push,
            output_device: None,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Layers defaults, an optional TOML file and `DECKCLOCK_*` environment
    /// variables. Without an explicit path, `deckclock.toml` is read if
    /// present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("interval_ms", defaults.interval_ms)?
            .set_default("protocol", "sysex")?
            .set_default("sysex_device_id", u64::from(defaults.sysex_device_id))?
            .set_default("note_channel", u64::from(defaults.note_channel))?
            .set_default("channels", defaults.channels.clone())?
            .set_default("cache_mode", "push")?
            .set_default("log_level", defaults.log_level.clone())?;

        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Where [`Settings::load`] reads its file layer from, for startup logs
    pub fn source_description(path: Option<&Path>) -> String {
        match path {
            Some(path) => path.display().to_string(),
            None => format!("defaults, {} if present", DEFAULT_CONFIG_FILE),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(ClockError::InvalidConfig(
                "interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.note_channel > 15 {
            return Err(ClockError::InvalidConfig(format!(
                "note_channel must be 0-15, got {}",
                self.note_channel
            )));
        }
        if self.sysex_device_id > 0x7F {
            return Err(ClockError::InvalidConfig(format!(
                "sysex_device_id must be 0x00-0x7F, got {:#04x}",
                self.sysex_device_id
            )));
        }
        if self.channels.is_empty() {
            return Err(ClockError::InvalidConfig(
                "at least one channel is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel) {
                return Err(ClockError::InvalidConfig(format!(
                    "channel {} is listed twice",
                    channel
                )));
            }
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn wire_protocol(&self) -> WireProtocol {
        WireProtocol::from_kind(self.protocol, self.sysex_device_id, self.note_channel)
    }

    pub fn channel_list(&self) -> Vec<Channel> {
        self.channels.iter().map(Channel::new).collect()
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.interval(), Duration::from_millis(375));
        assert_eq!(
            settings.wire_protocol(),
            WireProtocol::SysEx { device_id: 0x7A }
        );
        assert_eq!(settings.channel_list()[0].group(), "[Channel1]");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings {
            note_channel: 16,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClockError::InvalidConfig(_))
        ));

        settings.note_channel = 11;
        settings.interval_ms = 0;
        assert!(settings.validate().is_err());

        settings.interval_ms = 375;
        settings.channels = vec!["[Channel1]".into(), "[Channel1]".into()];
        assert!(settings.validate().is_err());

        settings.channels.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("deckclock-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(
            &path,
            "protocol = \"notes\"\nnote_channel = 4\ncache_mode = \"pull\"\nchannels = [\"[Channel1]\", \"[Channel2]\"]\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.protocol, ProtocolKind::Notes);
        assert_eq!(settings.wire_protocol(), WireProtocol::Notes { channel: 4 });
        assert_eq!(settings.cache_mode, CacheMode::Pull);
        assert_eq!(settings.channels.len(), 2);
        assert_eq!(settings.interval_ms, 375);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_source_description() {
        assert_eq!(
            Settings::source_description(Some(Path::new("/etc/deckclock.toml"))),
            "/etc/deckclock.toml"
        );
        assert_eq!(
            Settings::source_description(None),
            "defaults, deckclock.toml if present"
        );
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("deckclock-does-not-exist.toml");
        assert!(Settings::load(Some(&path)).is_err());
    }
}
