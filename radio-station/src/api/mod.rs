//! HTTP API for the station
//!
//! Serves the published position slots to polling clients, exposes catalog
//! management and clock control, and streams clock events over SSE.

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{build_router, run, AppContext};
