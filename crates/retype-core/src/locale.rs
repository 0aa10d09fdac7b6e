//! Locale-aware rendering of numbers and instants
//!
//! Formatters never reach for a global formatter instance. A [`FormatContext`]
//! is built once from [`FormatOptions`] and passed into every call.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

use crate::error::{Error, Result};

/// Separators and date-time layout for one display locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayLocale {
    /// BCP 47 tag, e.g. `en-US`
    pub tag: &'static str,
    /// Decimal separator (e.g. `.` in `en-US`, `,` in `de-DE`)
    pub decimal_sep: char,
    /// Thousands separator (e.g. `,` in `en-US`, `.` in `de-DE`)
    pub thousands_sep: char,
    /// chrono format string for a full date-time
    pub datetime_pattern: &'static str,
}

impl DisplayLocale {
    pub const fn en_us() -> Self {
        Self {
            tag: "en-US",
            decimal_sep: '.',
            thousands_sep: ',',
            datetime_pattern: "%-m/%-d/%Y, %-I:%M:%S %p",
        }
    }

    pub const fn en_gb() -> Self {
        Self {
            tag: "en-GB",
            decimal_sep: '.',
            thousands_sep: ',',
            datetime_pattern: "%d/%m/%Y, %H:%M:%S",
        }
    }

    pub const fn de_de() -> Self {
        Self {
            tag: "de-DE",
            decimal_sep: ',',
            thousands_sep: '.',
            datetime_pattern: "%-d.%-m.%Y, %H:%M:%S",
        }
    }

    /// French uses U+202F NARROW NO-BREAK SPACE for grouping.
    pub const fn fr_fr() -> Self {
        Self {
            tag: "fr-FR",
            decimal_sep: ',',
            thousands_sep: '\u{202F}',
            datetime_pattern: "%d/%m/%Y %H:%M:%S",
        }
    }

    /// All built-in locales
    pub const PRESETS: [DisplayLocale; 4] = [
        DisplayLocale::en_us(),
        DisplayLocale::en_gb(),
        DisplayLocale::de_de(),
        DisplayLocale::fr_fr(),
    ];

    /// Look up a built-in locale by tag (case-insensitive, `_` or `-`)
    pub fn from_tag(tag: &str) -> Result<Self> {
        let wanted = tag.trim().replace('_', "-");
        Self::PRESETS
            .into_iter()
            .find(|locale| locale.tag.eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::UnknownLocale(tag.to_string()))
    }
}

impl Default for DisplayLocale {
    fn default() -> Self {
        Self::en_us()
    }
}

/// Options for rendering cells
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Display locale
    pub locale: DisplayLocale,
    /// Offset instants are shown in, and naive literals are read in
    pub utc_offset: FixedOffset,
    /// Maximum fraction digits for numbers (default: 3)
    pub max_fraction_digits: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            locale: DisplayLocale::default(),
            utc_offset: Utc.fix(),
            max_fraction_digits: 3,
        }
    }
}

impl FormatOptions {
    /// Build the formatting context shared by every formatter
    pub fn context(&self) -> FormatContext {
        FormatContext {
            numbers: NumberFormatter::new(self.locale)
                .with_max_fraction_digits(self.max_fraction_digits),
            dates: DateRenderer::new(self.locale, self.utc_offset),
        }
    }
}

/// Shared formatting dependencies handed to every formatter
#[derive(Debug, Clone)]
pub struct FormatContext {
    pub numbers: NumberFormatter,
    pub dates: DateRenderer,
}

impl Default for FormatContext {
    fn default() -> Self {
        FormatOptions::default().context()
    }
}

/// Locale-aware number rendering with thousands grouping
#[derive(Debug, Clone)]
pub struct NumberFormatter {
    locale: DisplayLocale,
    max_fraction_digits: usize,
}

impl NumberFormatter {
    /// Create a formatter with three fraction digits
    pub fn new(locale: DisplayLocale) -> Self {
        Self {
            locale,
            max_fraction_digits: 3,
        }
    }

    /// Set the maximum number of fraction digits
    pub fn with_max_fraction_digits(mut self, digits: usize) -> Self {
        self.max_fraction_digits = digits;
        self
    }

    /// Locale this formatter renders for
    pub fn locale(&self) -> DisplayLocale {
        self.locale
    }

    /// Format a number, e.g. `1500` as `1,500` in `en-US`
    pub fn format(&self, value: f64) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "∞" } else { "-∞" }.to_string();
        }

        let (int_part, frac_part) = round_half_expand(value.abs(), self.max_fraction_digits);
        let frac_part = frac_part.trim_end_matches('0');

        let mut out = String::new();
        if value.is_sign_negative() {
            out.push('-');
        }
        out.push_str(&group_thousands(&int_part, self.locale.thousands_sep));
        if !frac_part.is_empty() {
            out.push(self.locale.decimal_sep);
            out.push_str(frac_part);
        }
        out
    }
}

/// Round the shortest decimal form of `value` to `digits` fraction digits,
/// ties away from zero. Returns the integer and fraction digits.
fn round_half_expand(value: f64, digits: usize) -> (String, String) {
    let shortest = value.to_string();
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));
    if frac_part.len() <= digits {
        return (int_part.to_string(), frac_part.to_string());
    }

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(digits))
        .collect();
    if frac_part.as_bytes()[digits] >= b'5' {
        let mut carry = true;
        for digit in kept.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
        }
    }

    let split = kept.len() - digits;
    let text = String::from_utf8_lossy(&kept);
    (text[..split].to_string(), text[split..].to_string())
}

fn group_thousands(int_part: &str, sep: char) -> String {
    let mut out = String::new();
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        let pos_from_end = len - i;
        out.push(ch);
        if pos_from_end > 1 && pos_from_end % 3 == 1 {
            out.push(sep);
        }
    }
    out
}

/// Renders instants in a fixed offset and reads date-time literals
#[derive(Debug, Clone)]
pub struct DateRenderer {
    pattern: &'static str,
    offset: FixedOffset,
}

/// Literals carrying their own offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Literals read in the display offset
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Date-only literals read in the display offset
const LOCAL_DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y/%m/%d"];

impl DateRenderer {
    pub fn new(locale: DisplayLocale, offset: FixedOffset) -> Self {
        Self {
            pattern: locale.datetime_pattern,
            offset,
        }
    }

    /// Offset used for display
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Render an instant, e.g. `3/9/2024, 1:38:09 PM` in `en-US` at UTC
    pub fn render(&self, instant: &DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.offset)
            .format(self.pattern)
            .to_string()
    }

    /// Interpret a number as milliseconds since the Unix epoch
    pub fn from_epoch_millis(&self, millis: f64) -> Option<DateTime<Utc>> {
        // ECMAScript time values are limited to +-8.64e15 ms
        if !millis.is_finite() || millis.abs() > 8.64e15 {
            return None;
        }
        Utc.timestamp_millis_opt(millis.trunc() as i64).single()
    }

    /// Parse a date-time literal leniently.
    ///
    /// ISO date-only literals are UTC; other literals without an offset are
    /// read in the display offset.
    pub fn parse_literal(&self, text: &str) -> Option<DateTime<Utc>> {
        let s = text.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }

        let zulu;
        let s = match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
            Some(stripped) => {
                zulu = format!("{stripped}+00:00");
                zulu.as_str()
            }
            None => s,
        };

        for format in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(s, format) {
                return Some(dt.with_timezone(&Utc));
            }
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return self.localize(naive);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
        }
        for format in LOCAL_DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, format) {
                return self.localize(date.and_hms_opt(0, 0, 0)?);
            }
        }
        None
    }

    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Parse an offset such as `+02:00`, `-0530`, `Z` or `UTC`
pub fn parse_utc_offset(text: &str) -> Option<FixedOffset> {
    let s = text.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }

    let (sign, rest) = match s.chars().next()? {
        '+' => (1, &s[1..]),
        '-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
