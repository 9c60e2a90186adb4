//! Track descriptor parsed from a catalog record

use crate::error::{Error, Result};
use radio_common::human_time::{format_clock_duration, parse_clock_duration};
use serde_json::{Map, Value};

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// A catalog record plus the fields the clock derives from it
///
/// The raw blob is kept verbatim so it can be served back to clients
/// unchanged, extra fields included.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDescriptor {
    id: String,
    raw: String,
    metadata: Map<String, Value>,
    duration: u64,
}

impl TrackDescriptor {
    /// Parse a raw record. Fails only when the blob is not a JSON object;
    /// a bad or missing duration parses as 0 seconds.
    pub fn parse(id: impl Into<String>, raw: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let raw = raw.into();
        let metadata = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(Error::InvalidTrack(format!(
                    "{}: expected a JSON object, got {}",
                    id,
                    json_kind(&other)
                )))
            }
            Err(e) => return Err(Error::InvalidTrack(format!("{}: {}", id, e))),
        };

        let duration = match metadata.get("duration") {
            Some(Value::String(s)) => parse_clock_duration(s),
            _ => 0,
        };

        Ok(Self {
            id,
            raw,
            metadata,
            duration,
        })
    }

    /// Catalog identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record exactly as stored
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn title(&self) -> &str {
        self.metadata
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_TITLE)
    }

    pub fn artist(&self) -> &str {
        self.metadata
            .get("artist")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_ARTIST)
    }

    /// Parsed duration in whole seconds
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Duration as `MM:SS`
    pub fn formatted_duration(&self) -> String {
        format_clock_duration(self.duration)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_record() {
        let raw = r#"{"title":"Blue","artist":"Joni","duration":"03:04","album":"Blue"}"#;
        let track = TrackDescriptor::parse("blue", raw).unwrap();
        assert_eq!(track.id(), "blue");
        assert_eq!(track.title(), "Blue");
        assert_eq!(track.artist(), "Joni");
        assert_eq!(track.duration(), 184);
        assert_eq!(track.formatted_duration(), "03:04");
        assert_eq!(track.raw(), raw);
        assert_eq!(track.metadata["album"], "Blue");
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let track = TrackDescriptor::parse("x", "{}").unwrap();
        assert_eq!(track.title(), "Unknown Title");
        assert_eq!(track.artist(), "Unknown Artist");
        assert_eq!(track.duration(), 0);
    }

    #[test]
    fn test_malformed_durations_parse_as_zero() {
        for duration in [r#""abc""#, r#""""#, "null", "215", r#""1:xx""#] {
            let raw = format!(r#"{{"title":"t","duration":{}}}"#, duration);
            let track = TrackDescriptor::parse("x", raw).unwrap();
            assert_eq!(track.duration(), 0, "duration {}", duration);
        }
    }

    #[test]
    fn test_hours_duration() {
        let track = TrackDescriptor::parse("x", r#"{"duration":"1:00:01"}"#).unwrap();
        assert_eq!(track.duration(), 3601);
    }

    #[test]
    fn test_non_object_is_rejected() {
        for raw in ["null", "[1,2]", "\"song\"", "42", "{not json"] {
            assert!(
                matches!(TrackDescriptor::parse("x", raw), Err(Error::InvalidTrack(_))),
                "raw {}",
                raw
            );
        }
    }
}
