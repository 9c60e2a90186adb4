//! Playback state owned by the clock

use crate::track::TrackDescriptor;
use radio_common::api::StartReference;
use serde::Serialize;

/// Clock status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStatus {
    /// No track loaded
    Empty,
    /// A track is active and counting
    Playing,
    /// Switching tracks (only held while the state lock is)
    Advancing,
}

/// Live clock state. Lives behind the clock's mutex; readers get a
/// [`PlaybackSnapshot`].
#[derive(Debug)]
pub(crate) struct PlaybackState {
    pub(crate) status: ClockStatus,
    pub(crate) current: Option<TrackDescriptor>,
    pub(crate) start_reference: StartReference,
    /// Seconds elapsed on the current track
    pub(crate) elapsed: u64,
    /// Index into the catalog snapshot
    pub(crate) cursor: usize,
    pub(crate) session_token: u32,
}

impl PlaybackState {
    pub(crate) fn new() -> Self {
        Self {
            status: ClockStatus::Empty,
            current: None,
            start_reference: StartReference::default(),
            elapsed: 0,
            cursor: 0,
            session_token: 0,
        }
    }

    /// Drop the current track and fall back to `Empty`
    pub(crate) fn clear_track(&mut self) {
        self.status = ClockStatus::Empty;
        self.current = None;
        self.elapsed = 0;
    }

    pub(crate) fn snapshot(&self) -> PlaybackSnapshot {
        let current = self.current.as_ref();
        PlaybackSnapshot {
            status: self.status,
            track_id: current.map(|t| t.id().to_string()),
            title: current.map(|t| t.title().to_string()),
            artist: current.map(|t| t.artist().to_string()),
            elapsed: self.elapsed,
            duration: current.map(TrackDescriptor::duration).unwrap_or(0),
            cursor: self.cursor,
            session_token: self.session_token,
            start_reference: self.start_reference,
        }
    }
}

/// Point-in-time copy of the clock state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub status: ClockStatus,
    pub track_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub elapsed: u64,
    pub duration: u64,
    pub cursor: usize,
    pub session_token: u32,
    pub start_reference: StartReference,
}

impl PlaybackSnapshot {
    /// Progress through the current track as a percentage
    pub fn progress_percent(&self) -> f64 {
        if self.track_id.is_some() && self.duration > 0 {
            self.elapsed as f64 / self.duration as f64 * 100.0
        } else {
            0.0
        }
    }
}
