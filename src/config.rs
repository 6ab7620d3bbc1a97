//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Settings handed to the speech transport, never read by the dialogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechSettings {
    pub locale: String,
    pub voice: String,
    /// Silence before a listen reports no input; zero waits forever
    pub no_input_timeout: Duration,
    pub complete_timeout: Duration,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            voice: "en-US-DavisNeural".to_string(),
            no_input_timeout: Duration::from_millis(5000),
            complete_timeout: Duration::ZERO,
        }
    }
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    pub speech: SpeechSettings,

    /// Send the start trigger as soon as the dialogue is waiting for it
    pub auto_start: bool,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let home = var("HOME").context("HOME is not set")?;
        let data_dir = PathBuf::from(&home)
            .join(".local")
            .join("share")
            .join("appointment-dm");

        let socket_path = var("DM_SOCKET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("dm.sock"));

        let defaults = SpeechSettings::default();
        let speech = SpeechSettings {
            locale: var("DM_LOCALE").unwrap_or(defaults.locale),
            voice: var("DM_VOICE").unwrap_or(defaults.voice),
            no_input_timeout: millis(&var, "DM_NOINPUT_TIMEOUT_MS")?
                .unwrap_or(defaults.no_input_timeout),
            complete_timeout: millis(&var, "DM_COMPLETE_TIMEOUT_MS")?
                .unwrap_or(defaults.complete_timeout),
        };

        let auto_start = match var("DM_AUTO_START") {
            Some(raw) => raw
                .parse::<bool>()
                .with_context(|| format!("DM_AUTO_START must be true or false, got {:?}", raw))?,
            None => false,
        };

        Ok(Self {
            socket_path,
            data_dir,
            speech,
            auto_start,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

fn millis(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>> {
    var(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_millis)
                .with_context(|| format!("{} must be milliseconds, got {:?}", key, raw))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(env(&[("HOME", "/home/dm")])).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/home/dm/.local/share/appointment-dm/dm.sock"));
        assert_eq!(config.speech, SpeechSettings::default());
        assert!(!config.auto_start);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(env(&[
            ("HOME", "/home/dm"),
            ("DM_SOCKET_PATH", "/tmp/dm.sock"),
            ("DM_LOCALE", "sv-SE"),
            ("DM_NOINPUT_TIMEOUT_MS", "2500"),
            ("DM_AUTO_START", "true"),
        ]))
        .unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/dm.sock"));
        assert_eq!(config.speech.locale, "sv-SE");
        assert_eq!(config.speech.voice, "en-US-DavisNeural");
        assert_eq!(config.speech.no_input_timeout, Duration::from_millis(2500));
        assert!(config.auto_start);
    }

    #[test]
    fn test_config_rejects_bad_timeout() {
        let result = Config::from_lookup(env(&[
            ("HOME", "/home/dm"),
            ("DM_COMPLETE_TIMEOUT_MS", "soon"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_requires_home() {
        assert!(Config::from_lookup(env(&[])).is_err());
    }
}
