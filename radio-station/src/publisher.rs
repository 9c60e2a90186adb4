//! Position publisher
//!
//! Externalizes the clock's position into three single-value JSON files so
//! stateless request handlers (and a restarted process) can read it:
//!
//! | slot | file | shape | fallback |
//! |---|---|---|---|
//! | start reference | `pos-data.json` | `{"t": f, "mod": n}` | `{"t": 0, "mod": 1}` |
//! | session token | `song-index.json` | `{"si": n}` | `{"si": 0}` |
//! | background index | `back-index.json` | `{"bi": n}` | `{"bi": 1}` |
//!
//! Writes go to a sibling temp file that is then renamed over the slot, so a
//! reader sees either the previous value or the new one. Reads never fail:
//! a missing or corrupt slot yields the fallback.

use crate::error::Result;
use radio_common::api::{BackgroundIndex, SessionIndex, StartReference};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

pub const POSITION_FILE: &str = "pos-data.json";
pub const SESSION_FILE: &str = "song-index.json";
pub const BACKGROUND_FILE: &str = "back-index.json";

/// Write `bytes` to `path` via temp file + rename
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("slot");
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}

/// Value stored in a slot, with the check applied on read
pub trait SlotValue: Serialize + DeserializeOwned + Default {
    fn is_valid(&self) -> bool {
        true
    }
}

impl SlotValue for StartReference {
    fn is_valid(&self) -> bool {
        StartReference::is_valid(self)
    }
}

impl SlotValue for SessionIndex {}

impl SlotValue for BackgroundIndex {}

/// One durable, single-value JSON slot
pub struct JsonSlot<T> {
    path: PathBuf,
    _value: PhantomData<fn() -> T>,
}

impl<T: SlotValue> JsonSlot<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the slot with `value`
    pub fn publish(&self, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value).map_err(radio_common::Error::from)?;
        write_atomic(&self.path, &bytes)?;
        debug!("Published {}", self.path.display());
        Ok(())
    }

    /// Last published value, or the fallback
    pub fn read(&self) -> T {
        let content = match std::fs::read(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Slot {} unreadable ({}), using default", self.path.display(), e);
                return T::default();
            }
        };
        match serde_json::from_slice::<T>(&content) {
            Ok(value) if value.is_valid() => value,
            Ok(_) => {
                warn!("Slot {} holds an out-of-range value, using default", self.path.display());
                T::default()
            }
            Err(e) => {
                warn!("Slot {} is corrupt ({}), using default", self.path.display(), e);
                T::default()
            }
        }
    }
}

/// The three position slots of the station
pub struct PositionPublisher {
    position: JsonSlot<StartReference>,
    session: JsonSlot<SessionIndex>,
    background: JsonSlot<BackgroundIndex>,
}

impl PositionPublisher {
    /// Slots live in `dir`, which is created if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            position: JsonSlot::new(dir.join(POSITION_FILE)),
            session: JsonSlot::new(dir.join(SESSION_FILE)),
            background: JsonSlot::new(dir.join(BACKGROUND_FILE)),
        })
    }

    /// Publish a start reference. Failures are logged, not returned: the
    /// clock keeps running on its in-memory state.
    pub fn publish_start_reference(&self, value: StartReference) {
        if let Err(e) = self.position.publish(&value) {
            error!("Failed to publish start reference: {}", e);
        }
    }

    pub fn start_reference(&self) -> StartReference {
        self.position.read()
    }

    pub fn publish_session_token(&self, si: u32) {
        if let Err(e) = self.session.publish(&SessionIndex { si }) {
            error!("Failed to publish session token: {}", e);
        }
    }

    pub fn session_token(&self) -> SessionIndex {
        self.session.read()
    }

    pub fn publish_background_index(&self, bi: u32) {
        if let Err(e) = self.background.publish(&BackgroundIndex { bi }) {
            error!("Failed to publish background index: {}", e);
        }
    }

    pub fn background_index(&self) -> BackgroundIndex {
        self.background.read()
    }
}
