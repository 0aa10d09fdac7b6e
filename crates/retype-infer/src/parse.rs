//! Parsers for the textual encodings found in uploaded cells

use chrono::{DateTime, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use retype_core::{DateRenderer, DisplayLocale, IsoDuration};

use crate::frame::NANOS_PER_SEC;

/// A parsed numeric literal
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub(crate) fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

/// Parse a decimal literal such as `75`, `-2.5` or `1e3`
pub(crate) fn parse_number(text: &str) -> Option<Num> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    let digits = s.strip_prefix(&['+', '-'][..]).unwrap_or(s);
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(i) = s.parse::<i64>() {
            return Some(Num::Int(i));
        }
    }

    if s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return s.parse::<f64>().ok().map(Num::Float);
    }
    None
}

/// Parse a float leniently, accepting `inf` and `nan` spellings
fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Parse `a+bj`, `bj` or `a` into a complex pair.
///
/// A `+` must split the text into exactly two parts; negative imaginary
/// parts are not recognized. NaN parts yield `None`.
pub fn parse_complex(text: &str) -> Option<(f64, f64)> {
    let (re, im) = if text.contains('+') {
        let mut parts = text.split('+');
        let (Some(real), Some(imag), None) = (parts.next(), parts.next(), parts.next()) else {
            return None;
        };
        let imag = imag.strip_suffix('j').unwrap_or(imag);
        (parse_float(real)?, parse_float(imag)?)
    } else if text.contains('j') {
        let mut chars = text.chars();
        chars.next_back();
        (0.0, parse_float(chars.as_str())?)
    } else {
        if text.is_empty() {
            return None;
        }
        (parse_float(text)?, 0.0)
    };

    if re.is_nan() || im.is_nan() {
        return None;
    }
    Some((re, im))
}

static CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<neg>-)?(?:(?P<days>\d+)\s*days?,?\s*)?(?P<h>\d+):(?P<m>\d{1,2}):(?P<s>\d{1,2}(?:\.\d+)?)$")
        .unwrap()
});

static DAYS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<neg>-)?(?P<days>\d+)\s*days?$").unwrap());

static UNIT_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\s*\d+(?:\.\d+)?\s*(?:days|day|d|hours|hour|hr|h|minutes|minute|min|m|seconds|second|sec|s|ms|us|ns)\s*)+$")
        .unwrap()
});

static UNIT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<n>\d+(?:\.\d+)?)\s*(?P<unit>days|day|d|hours|hour|hr|h|minutes|minute|min|ms|us|ns|m|seconds|second|sec|s)")
        .unwrap()
});

/// Parse an elapsed-time literal into nanoseconds.
///
/// Accepts `HH:MM:SS[.f]`, `D days HH:MM:SS`, `D days`, ISO-8601
/// (`P0DT1H30M`), unit tokens (`1h30m`) and bare integers (nanoseconds).
pub fn parse_timedelta(text: &str) -> Option<i64> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    let has_digits = s.chars().any(|c| c.is_ascii_digit());
    if let Some(iso) = IsoDuration::parse(s).filter(|_| has_digits) {
        let whole =
            ((iso.days as f64 * 24.0 + iso.hours as f64) * 60.0 + iso.minutes as f64) * 60.0;
        return seconds_to_nanos(whole + iso.seconds);
    }

    if let Some(caps) = CLOCK.captures(s) {
        let days: f64 = caps.name("days").map_or(Some(0.0), |m| m.as_str().parse().ok())?;
        let hours: f64 = caps["h"].parse().ok()?;
        let minutes: f64 = caps["m"].parse().ok()?;
        let seconds: f64 = caps["s"].parse().ok()?;
        let total = days * 86_400.0 + hours * 3600.0 + minutes * 60.0 + seconds;
        let ns = seconds_to_nanos(total)?;
        return Some(if caps.name("neg").is_some() { -ns } else { ns });
    }

    if let Some(caps) = DAYS_ONLY.captures(s) {
        let days: f64 = caps["days"].parse().ok()?;
        let ns = seconds_to_nanos(days * 86_400.0)?;
        return Some(if caps.name("neg").is_some() { -ns } else { ns });
    }

    if UNIT_TOKENS.is_match(s) {
        let mut total = 0.0;
        for caps in UNIT_TOKEN.captures_iter(s) {
            let n: f64 = caps["n"].parse().ok()?;
            let scale = match &caps["unit"] {
                "days" | "day" | "d" => 86_400.0,
                "hours" | "hour" | "hr" | "h" => 3600.0,
                "minutes" | "minute" | "min" | "m" => 60.0,
                "seconds" | "second" | "sec" | "s" => 1.0,
                "ms" => 1e-3,
                "us" => 1e-6,
                _ => 1e-9,
            };
            total += n * scale;
        }
        return seconds_to_nanos(total);
    }

    match parse_number(s) {
        Some(Num::Int(ns)) => Some(ns),
        _ => None,
    }
}

fn seconds_to_nanos(seconds: f64) -> Option<i64> {
    let ns = (seconds * NANOS_PER_SEC as f64).round();
    if ns.is_finite() && ns.abs() < i64::MAX as f64 {
        Some(ns as i64)
    } else {
        None
    }
}

/// Formats tried, in order, when looking for one consistent date format
pub(crate) const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%Y/%d/%m",
];

/// Parse with one strptime-style format. The flag is set when the format
/// carries an offset.
pub(crate) fn strptime(text: &str, format: &str) -> Option<(DateTime<Utc>, bool)> {
    let s = text.trim();
    if format.contains("%z") {
        let dt = DateTime::parse_from_str(s, format)
            .or_else(|_| DateTime::parse_from_str(s, &format.replace("%z", "%:z")))
            .ok()?;
        return Some((dt.with_timezone(&Utc), true));
    }
    if format.contains("%H") {
        let naive = NaiveDateTime::parse_from_str(s, format).ok()?;
        return Some((Utc.from_utc_datetime(&naive), false));
    }
    let date = NaiveDate::parse_from_str(s, format).ok()?;
    Some((Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?), false))
}

/// The first format in [`DATE_FORMATS`] that parses `text`
pub(crate) fn detect_date_format(text: &str) -> Option<&'static str> {
    DATE_FORMATS
        .iter()
        .copied()
        .find(|format| strptime(text, format).is_some())
}

/// Parse a date-time literal in any supported layout; naive values are UTC
pub(crate) fn parse_datetime_mixed(text: &str) -> Option<DateTime<Utc>> {
    let dates = DateRenderer::new(DisplayLocale::default(), Utc.fix());
    dates.parse_literal(text)
}

/// Representable range of nanosecond timestamps
pub(crate) fn in_timestamp_range(dt: &DateTime<Utc>) -> bool {
    dt.timestamp_nanos_opt().is_some()
}
