//! ISO-8601 duration literals (`P4DT6H30M50S`)

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .case_insensitive(true)
        .build()
        .unwrap()
});

/// A day/time duration as written, without normalization
///
/// `PT102H` keeps 102 hours rather than folding them into days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsoDuration {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: f64,
}

impl IsoDuration {
    /// Check a literal against the duration grammar
    pub fn is_valid(text: &str) -> bool {
        ISO_DURATION.is_match(text)
    }

    /// Parse a literal; `None` if it is outside the grammar or overflows
    pub fn parse(text: &str) -> Option<Self> {
        let caps = ISO_DURATION.captures(text)?;
        let unit = |idx: usize| -> Option<u64> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(0),
            }
        };
        let seconds = match caps.get(4) {
            Some(m) => m.as_str().parse().ok()?,
            None => 0.0,
        };

        Some(Self {
            days: unit(1)?,
            hours: unit(2)?,
            minutes: unit(3)?,
            seconds,
        })
    }

    /// Space-joined days, hours and minutes; zero units are left out and
    /// seconds are never shown. Empty when every shown unit is zero.
    pub fn humanize(&self) -> String {
        [
            (self.days, "day", "days"),
            (self.hours, "hour", "hours"),
            (self.minutes, "minute", "minutes"),
        ]
        .iter()
        .filter(|(count, _, _)| *count > 0)
        .map(|(count, one, many)| {
            if *count == 1 {
                format!("{count} {one}")
            } else {
                format!("{count} {many}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
    }
}
