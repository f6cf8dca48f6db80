//! Runtime tuning loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Constants shared by every agent of a host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// Delta time used to run exit behaviors to completion.
    pub exit_dt: f32,
    /// Tolerance below which a duration or interval counter counts as zero.
    pub time_epsilon: f32,
    /// Buffered events per event name on the bus.
    pub event_capacity: usize,
}

impl RuntimeSettings {
    pub const DEFAULT_EXIT_DT: f32 = 1.0e6;
    pub const DEFAULT_TIME_EPSILON: f32 = 1.0e-4;
    pub const DEFAULT_EVENT_CAPACITY: usize = 64;

    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Format(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            exit_dt: Self::DEFAULT_EXIT_DT,
            time_epsilon: Self::DEFAULT_TIME_EPSILON,
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
        }
    }
}
