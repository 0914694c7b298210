//! Run settings
//!
//! Loaded from an optional JSON file; any missing field takes its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest floor edge the runner will build, in cells
pub const MAX_LEVEL_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Headless run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed for the session
    pub seed: u64,
    /// Frames to simulate
    pub frames: u32,
    /// Simulated wall-clock time between frames (ms)
    pub frame_ms: f64,
    /// Faces orbiting the swarm brain
    pub swarm_size: usize,
    /// Pedestrians spawned on the level
    pub walkers: usize,
    /// Edge length of the square floor, in cells
    pub level_size: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 1,
            frames: 600,
            frame_ms: 1000.0 / 60.0,
            swarm_size: 12,
            walkers: 4,
            level_size: 7,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Floor edge length clamped to `[2, MAX_LEVEL_SIZE]`
    pub fn level_cells(&self) -> usize {
        usize::try_from(self.level_size)
            .unwrap_or(0)
            .clamp(2, MAX_LEVEL_SIZE)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
