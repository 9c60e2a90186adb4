//! Clock-style duration strings (`SS`, `MM:SS`, `HH:MM:SS`)
//!
//! Track metadata carries its length as a human-written string. Parsing is
//! lenient about surrounding whitespace but never fails: anything that is not
//! a colon-separated list of non-negative integers is treated as zero seconds.

/// Parse a clock-style duration into whole seconds.
///
/// Each colon-separated component is folded base-60, so `"1:02:03"` is
/// 3723 seconds and a bare `"90"` is 90 seconds. Empty, negative, or
/// non-numeric input yields 0.
///
/// # Examples
///
/// ```
/// use radio_common::human_time::parse_clock_duration;
///
/// assert_eq!(parse_clock_duration("03:30"), 210);
/// assert_eq!(parse_clock_duration("01:00:05"), 3605);
/// assert_eq!(parse_clock_duration("abc"), 0);
/// ```
pub fn parse_clock_duration(input: &str) -> u64 {
    let mut total: u64 = 0;
    for part in input.trim().split(':') {
        let value = match part.trim().parse::<u64>() {
            Ok(v) => v,
            Err(_) => return 0,
        };
        total = match total.checked_mul(60).and_then(|t| t.checked_add(value)) {
            Some(t) => t,
            None => return 0,
        };
    }
    total
}

/// Format whole seconds as `MM:SS` (minutes are not wrapped into hours).
///
/// # Examples
///
/// ```
/// use radio_common::human_time::format_clock_duration;
///
/// assert_eq!(format_clock_duration(5), "00:05");
/// assert_eq!(format_clock_duration(3723), "62:03");
/// ```
pub fn format_clock_duration(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
