//! Player configuration

use crate::error::{PlaybackError, Result};
use crate::volume::DEFAULT_LEVEL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "waveline.toml";

/// Environment variable prefix (`WAVELINE_INITIAL_VOLUME=0.8`, ...)
pub const ENV_PREFIX: &str = "WAVELINE";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Volume at startup (0.0-1.0)
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    /// Position sampler cadence in milliseconds
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Shuffle enabled at startup
    #[serde(default)]
    pub shuffle: bool,

    /// Repeat enabled at startup
    #[serde(default)]
    pub repeat: bool,

    /// Move to Stopped when a song ends and there is nothing to advance to
    #[serde(default = "default_stop_at_queue_end")]
    pub stop_at_queue_end: bool,

    /// Fixed shuffle seed (reproducible order); entropy when unset
    #[serde(default)]
    pub shuffle_seed: Option<u64>,

    /// Capacity of the service command channel
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,

    /// Capacity of the service event broadcast channel
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_initial_volume() -> f32 {
    DEFAULT_LEVEL
}

fn default_sample_interval_ms() -> u64 {
    1000
}

fn default_stop_at_queue_end() -> bool {
    true
}

fn default_command_buffer() -> usize {
    64
}

fn default_event_buffer() -> usize {
    256
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_initial_volume(),
            sample_interval_ms: default_sample_interval_ms(),
            shuffle: false,
            repeat: false,
            stop_at_queue_end: default_stop_at_queue_end(),
            shuffle_seed: None,
            command_buffer: default_command_buffer(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `waveline.toml` in the
    /// working directory is used if present. `WAVELINE_*` variables
    /// override file values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        settings = match path {
            Some(path) => settings.add_source(config::File::from(path.to_path_buf())),
            None => settings
                .add_source(config::File::from(PathBuf::from(DEFAULT_CONFIG_FILE)).required(false)),
        };

        settings = settings.add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        let player: PlayerConfig = config
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        player.validate()?;
        Ok(player)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.initial_volume.is_finite() || !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PlaybackError::Config(format!(
                "initial_volume must be within 0.0..=1.0, got {}",
                self.initial_volume
            )));
        }

        if self.sample_interval_ms == 0 {
            return Err(PlaybackError::Config(
                "sample_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.command_buffer == 0 || self.event_buffer == 0 {
            return Err(PlaybackError::Config(
                "channel buffers must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Position sampler cadence
    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }
}
