//! radio-station specific configuration

use radio_common::api::types::DEFAULT_MODULUS;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory (under the root folder) holding track records
pub const AUDIO_DIR: &str = "audios";
/// Directory (under the root folder) holding published position slots
pub const DATA_DIR: &str = "data";
/// Directory (under the root folder) holding background images
pub const BACKGROUND_DIR: &str = "static/images/background";

/// Station configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub root_folder: PathBuf,
    pub port: u16,
    pub clock: ClockConfig,
    /// Delay between background rotations
    pub background_interval: Duration,
}

impl Config {
    pub fn new(root_folder: PathBuf) -> Self {
        Self {
            root_folder,
            port: 5000,
            clock: ClockConfig::default(),
            background_interval: Duration::from_secs(60),
        }
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.root_folder.join(AUDIO_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root_folder.join(DATA_DIR)
    }

    pub fn background_dir(&self) -> PathBuf {
        self.root_folder.join(Path::new(BACKGROUND_DIR))
    }
}

/// Playback clock timing
#[derive(Debug, Clone)]
pub struct ClockConfig {
    /// Modulus applied to start references
    pub modulus: u64,
    /// Advance-loop cadence; one tick is one second of track time
    pub tick_interval: Duration,
    /// Upper bound on how long `stop()` waits for the loop to exit
    pub stop_timeout: Duration,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            modulus: DEFAULT_MODULUS,
            tick_interval: Duration::from_secs(1),
            stop_timeout: Duration::from_secs(5),
        }
    }
}
