//! # Radio Station Library (radio-station)
//!
//! One authoritative playback position shared by every listener. The
//! [`clock::PlaybackClock`] walks the [`catalog::TrackCatalog`] on a
//! per-second timer and publishes a wall-clock start reference through the
//! [`publisher::PositionPublisher`]; clients poll it over HTTP and compute
//! the playhead locally.

pub mod api;
pub mod background;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod publisher;
pub mod track;

pub use error::{Error, Result};
