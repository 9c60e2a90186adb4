//! Published position types
//!
//! Each type has a fixed fallback (its `Default`) that readers substitute
//! when a persisted slot is missing or corrupt.

use crate::time::modulo_seconds;
use serde::{Deserialize, Serialize};

/// Default modulus used to bound start references
pub const DEFAULT_MODULUS: u64 = 100_000;

/// Wall-clock anchor of the currently playing track
///
/// `t` is the Unix time (seconds) at which the track started, reduced modulo
/// `modulus`. A client computes its playhead as `(now mod modulus) - t`.
///
/// # Examples
///
/// ```
/// use radio_common::api::StartReference;
///
/// let start = StartReference::at(1_000_123.0, 100_000);
/// assert_eq!(start.t, 123.0);
/// assert_eq!(start.elapsed_at(1_000_133.5), 10.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartReference {
    /// Start time reduced modulo `modulus`, always in `[0, modulus)`
    pub t: f64,
    /// Modulus applied to the wall clock
    #[serde(rename = "mod")]
    pub modulus: u64,
}

impl StartReference {
    /// Anchor a track starting at `unix_seconds`
    pub fn at(unix_seconds: f64, modulus: u64) -> Self {
        let modulus = modulus.max(1);
        Self {
            t: modulo_seconds(unix_seconds, modulus),
            modulus,
        }
    }

    /// Anchor a track starting now
    pub fn now(modulus: u64) -> Self {
        Self::at(crate::time::unix_seconds(), modulus)
    }

    /// Seconds elapsed since the anchor as seen at `unix_seconds`.
    ///
    /// Wraps across a modulus rollover instead of going negative.
    pub fn elapsed_at(&self, unix_seconds: f64) -> f64 {
        let now = modulo_seconds(unix_seconds, self.modulus);
        modulo_seconds(now - self.t, self.modulus)
    }

    /// True when the invariant `0 <= t < mod` holds and the modulus is non-zero
    pub fn is_valid(&self) -> bool {
        self.modulus > 0 && self.t.is_finite() && self.t >= 0.0 && self.t < self.modulus as f64
    }
}

impl Default for StartReference {
    fn default() -> Self {
        Self { t: 0.0, modulus: 1 }
    }
}

/// Session token slot: `{"si": n}`
///
/// Changes on every track switch; clients compare it to decide whether to
/// re-fetch the current song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionIndex {
    pub si: u32,
}

/// Background image slot: `{"bi": n}` (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundIndex {
    pub bi: u32,
}

impl Default for BackgroundIndex {
    fn default() -> Self {
        Self { bi: 1 }
    }
}

/// Generic status body for error responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}
