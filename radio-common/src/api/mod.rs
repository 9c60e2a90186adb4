//! Shared wire types for the radio HTTP surface
//!
//! The published position slots and the JSON bodies returned to polling
//! clients. Field names here are the client-sync wire format and must not
//! change.

pub mod types;

pub use types::{BackgroundIndex, SessionIndex, StartReference, StatusResponse};
