//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Seconds since the Unix epoch as a float, millisecond resolution
pub fn unix_seconds() -> f64 {
    now().timestamp_millis() as f64 / 1000.0
}

/// Reduce a timestamp (seconds) into `[0, modulus)`.
///
/// A zero modulus yields 0.0 instead of NaN.
pub fn modulo_seconds(seconds: f64, modulus: u64) -> f64 {
    if modulus == 0 {
        return 0.0;
    }
    let m = modulus as f64;
    let r = seconds.rem_euclid(m);
    // rem_euclid can round up to exactly `m` for tiny negative inputs
    if r >= m {
        0.0
    } else {
        r
    }
}
