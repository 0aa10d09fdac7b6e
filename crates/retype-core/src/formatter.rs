//! Cell formatters, one per logical type
//!
//! Every formatter maps a raw cell to a display string, or `None` when there
//! is nothing to show. None of them fail: malformed input degrades to a fixed
//! sentinel ([`INVALID_DURATION`], [`INVALID_DATE`], [`ZERO_COMPLEX`]).

use chrono::{DateTime, Utc};

use crate::catalog::LogicalType;
use crate::duration::IsoDuration;
use crate::locale::FormatContext;
use crate::value::CellValue;

/// Shown for values outside the duration grammar
pub const INVALID_DURATION: &str = "Invalid Duration";

/// Shown for values that do not denote an instant
pub const INVALID_DATE: &str = "Invalid Date";

/// Shown for bare values that are not numbers in a complex column
pub const ZERO_COMPLEX: &str = "0+0j";

/// Display formatter attached to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    /// Locale-grouped number
    Number,
    /// Locale date-time.
    ///
    /// `origin` is the column's logical type before the user edited it. When
    /// it is [`LogicalType::Number`], raw values are read as epoch milliseconds.
    Date { origin: Option<LogicalType> },
    /// Days, hours and minutes of an ISO-8601 duration
    Duration,
    /// `<real>+<imag>j`
    Complex,
    /// Value as is, except complex pairs
    Text,
}

/// Formatter for a logical type
pub fn formatter_for(ty: LogicalType) -> Formatter {
    match ty {
        LogicalType::Number => Formatter::Number,
        LogicalType::Date => Formatter::Date { origin: None },
        LogicalType::Duration => Formatter::Duration,
        LogicalType::Complex => Formatter::Complex,
        LogicalType::Text | LogicalType::Category => Formatter::Text,
    }
}

/// Formatter for a logical type wire name; `None` (identity display) when
/// the name is not a known type
pub fn formatter_for_name(name: &str) -> Option<Formatter> {
    LogicalType::from_name(name).map(formatter_for)
}

impl Formatter {
    /// Formatter for a column edited to `ty` whose server-confirmed type is `origin`
    pub fn for_edit(ty: LogicalType, origin: LogicalType) -> Self {
        match formatter_for(ty) {
            Formatter::Date { .. } => Formatter::Date {
                origin: Some(origin),
            },
            other => other,
        }
    }

    /// Render one cell
    pub fn format(&self, value: &CellValue, ctx: &FormatContext) -> Option<String> {
        match self {
            Formatter::Number => format_number(value, ctx),
            Formatter::Date { origin } => format_date(value, *origin, ctx),
            Formatter::Duration => format_duration(value),
            Formatter::Complex => format_complex(value, ctx),
            Formatter::Text => format_text(value, ctx),
        }
    }
}

/// Locale-grouped number; `None` for falsy input, zero included
pub fn format_number(value: &CellValue, ctx: &FormatContext) -> Option<String> {
    if value.is_falsy() {
        return None;
    }
    Some(ctx.numbers.format(value.to_number()))
}

/// Locale date-time; `None` for falsy input.
///
/// Without an origin hint the value is rendered as given (date columns are
/// pre-parsed when rows are built). With a hint, the value is converted to
/// an instant first, as epoch milliseconds when the origin is a number.
pub fn format_date(
    value: &CellValue,
    origin: Option<LogicalType>,
    ctx: &FormatContext,
) -> Option<String> {
    if value.is_falsy() {
        return None;
    }

    let Some(origin) = origin else {
        return Some(locale_string(value, ctx));
    };

    if origin == LogicalType::Number {
        let millis = value.to_number();
        if !millis.is_nan() {
            return Some(render_instant(ctx.dates.from_epoch_millis(millis), ctx));
        }
    }

    Some(render_instant(to_instant(value, ctx), ctx))
}

/// Days, hours and minutes of an ISO-8601 duration; `None` for falsy input
pub fn format_duration(value: &CellValue) -> Option<String> {
    if value.is_falsy() {
        return None;
    }

    let text = value.to_string();
    if !IsoDuration::is_valid(&text) {
        tracing::trace!(value = %text, "not an ISO-8601 duration");
        return Some(INVALID_DURATION.to_string());
    }

    let rendered = IsoDuration::parse(&text)
        .map(|duration| duration.humanize())
        .unwrap_or_default();
    if rendered.is_empty() {
        return Some(INVALID_DURATION.to_string());
    }
    Some(rendered)
}

/// `<real>+<imag>j` for pairs, `<n>+0j` for bare numbers, [`ZERO_COMPLEX`]
/// for anything else; `None` for falsy bare input
pub fn format_complex(value: &CellValue, ctx: &FormatContext) -> Option<String> {
    if let CellValue::Complex { real, imag } = value {
        return Some(complex_pair(*real, *imag, ctx));
    }
    if value.is_falsy() {
        return None;
    }

    let n = value.to_number();
    if n.is_nan() {
        return Some(ZERO_COMPLEX.to_string());
    }
    Some(format!("{}+0j", ctx.numbers.format(n)))
}

/// Value unchanged, except complex pairs which render like [`format_complex`]
pub fn format_text(value: &CellValue, ctx: &FormatContext) -> Option<String> {
    match value {
        CellValue::Null => None,
        CellValue::Complex { real, imag } => Some(complex_pair(*real, *imag, ctx)),
        other => Some(other.to_string()),
    }
}

fn complex_pair(real: f64, imag: f64, ctx: &FormatContext) -> String {
    format!(
        "{}+{}j",
        ctx.numbers.format(real),
        ctx.numbers.format(imag)
    )
}

fn to_instant(value: &CellValue, ctx: &FormatContext) -> Option<DateTime<Utc>> {
    match value {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Number(n) => ctx.dates.from_epoch_millis(*n),
        CellValue::Bool(b) => ctx.dates.from_epoch_millis(f64::from(u8::from(*b))),
        CellValue::Text(s) => ctx.dates.parse_literal(s),
        CellValue::Null | CellValue::Complex { .. } | CellValue::InvalidDate | CellValue::Json(_) => {
            None
        }
    }
}

fn render_instant(instant: Option<DateTime<Utc>>, ctx: &FormatContext) -> String {
    match instant {
        Some(dt) => ctx.dates.render(&dt),
        None => INVALID_DATE.to_string(),
    }
}

fn locale_string(value: &CellValue, ctx: &FormatContext) -> String {
    match value {
        CellValue::DateTime(dt) => ctx.dates.render(dt),
        CellValue::InvalidDate => INVALID_DATE.to_string(),
        CellValue::Number(n) => ctx.numbers.format(*n),
        CellValue::Complex { real, imag } => complex_pair(*real, *imag, ctx),
        other => other.to_string(),
    }
}
