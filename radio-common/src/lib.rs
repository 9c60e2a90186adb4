//! # Radio Common Library
//!
//! Shared code for the shared-radio workspace:
//! - Published position wire types (start reference, index slots)
//! - Event types and the broadcast EventBus
//! - Configuration loading
//! - Time and clock-duration helpers

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod time;

pub use error::{Error, Result};
