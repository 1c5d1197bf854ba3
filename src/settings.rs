use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::core::synth::{CHUNK_CAPACITY, MAX_VOLUME, MIN_PERIODS, SAMPLE_RATE};
use crate::core::volume::{DEFAULT_VOLUME, VOLUME_STEP};
use crate::error::{Error, Result};

const APP_DIR: &str = "keyphone";
const SETTINGS_FILE: &str = "settings.json";

/// Instrument settings, stored as JSON in the user config directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sample_rate: u32,
    pub channels: u16,
    /// Upper bound on samples per chunk
    pub chunk_capacity: usize,
    /// Complete periods per chunk
    pub periods: usize,
    pub initial_volume: f32,
    pub volume_step: f32,
    pub max_volume: f32,
    /// MIDI input port name; the first port is used when unset
    pub midi_port: Option<String>,
    /// Control change numbers that step the volume
    pub volume_up_cc: u8,
    pub volume_down_cc: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: 1,
            chunk_capacity: CHUNK_CAPACITY,
            periods: MIN_PERIODS,
            initial_volume: DEFAULT_VOLUME,
            volume_step: VOLUME_STEP,
            max_volume: MAX_VOLUME,
            midi_port: None,
            volume_up_cc: 20,
            volume_down_cc: 21,
        }
    }
}

impl Settings {
    pub fn settings_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Settings("could not determine config directory".to_string()))?;
        Ok(dir.join(APP_DIR))
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::settings_dir()?.join(SETTINGS_FILE))
    }

    /// Load settings from `path`, writing the defaults there if it does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let settings = Self::load(path)?;
            log::info!("Loaded settings from {}", path.display());
            Ok(settings)
        } else {
            let settings = Self::default();
            settings.save(path)?;
            log::info!("Wrote default settings to {}", path.display());
            Ok(settings)
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let settings: Self = serde_json::from_reader(file)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::Settings("sample_rate must be positive".to_string()));
        }
        if self.channels == 0 {
            return Err(Error::Settings("channels must be positive".to_string()));
        }
        if self.chunk_capacity == 0 {
            return Err(Error::Settings("chunk_capacity must be positive".to_string()));
        }
        if self.periods == 0 {
            return Err(Error::Settings("periods must be positive".to_string()));
        }
        if !(0.0..=MAX_VOLUME).contains(&self.max_volume) {
            return Err(Error::Settings(format!("max_volume must be within 0..={}", MAX_VOLUME)));
        }
        if !(0.0..=self.max_volume).contains(&self.initial_volume) {
            return Err(Error::Settings(format!(
                "initial_volume must be within 0..={}",
                self.max_volume
            )));
        }
        if !(self.volume_step > 0.0 && self.volume_step.is_finite()) {
            return Err(Error::Settings("volume_step must be positive".to_string()));
        }
        Ok(())
    }
}
