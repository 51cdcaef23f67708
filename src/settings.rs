//! Driver settings with persistence
//!
//! Settings are saved to `~/.config/kestrel/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use kestrel_core::{load_toml, Bounds, ConfigError, TimeConfig};
use kestrel_game::REMOVAL_THRESHOLD;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All driver settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub time: TimeConfig,
    pub world: WorldSettings,
    pub simulation: SimulationSettings,
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kestrel"))
    }

    /// Get the settings file path
    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            warn!("Could not determine config directory");
            return Self::default();
        };

        if !path.exists() {
            info!("No settings file found, writing defaults");
            let settings = Self::default();
            if let Err(e) = settings.save_to(&path) {
                warn!("Failed to write default settings: {}", e);
            }
            return settings;
        }

        match Self::load_from(&path) {
            Ok(settings) => {
                info!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        load_toml(path)
    }

    /// Save settings to `path`, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

/// World layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Playable area
    pub bounds: Bounds,
    /// How far outside the bounds entities may travel before removal
    pub removal_padding: f32,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            removal_padding: REMOVAL_THRESHOLD,
        }
    }
}

/// Headless run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Frames to simulate before exiting
    pub frames: u32,
    /// Raw delta fed to every frame, in seconds
    pub frame_delta: f32,
    /// Seconds between spawns of each emitter
    pub spawn_interval: f32,
    /// Number of emitters placed in the world
    pub emitters: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            frames: 600,
            frame_delta: 1.0 / 60.0,
            spawn_interval: 0.25,
            emitters: 4,
        }
    }
}
