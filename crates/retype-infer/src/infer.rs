//! Column type inference and conversion

use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use retype_core::{ColumnChange, LogicalType};

use crate::error::{InferError, InferResult};
use crate::frame::{Dtype, Frame, Scalar, Series, NANOS_PER_SEC};
use crate::options::InferOptions;
use crate::parse::{
    detect_date_format, in_timestamp_range, parse_complex, parse_datetime_mixed, parse_number,
    parse_timedelta, strptime, Num,
};

/// Apply explicit conversions, then infer types for the remaining text columns.
///
/// Explicit conversions are forced whatever share of values they lose. Every
/// other `object` column is tried as numeric, complex, datetime and timedelta
/// in that order; the first conversion leaving at most
/// [`InferOptions::errors_rate`] missing wins. Low-cardinality results become
/// categories afterwards.
pub fn infer_and_convert(
    mut frame: Frame,
    explicit: &[ColumnChange],
    options: &InferOptions,
) -> InferResult<Frame> {
    for change in explicit {
        let Some(series) = frame.column_mut(&change.field) else {
            tracing::warn!(field = %change.field, "conversion requested for unknown column");
            return Err(InferError::UnknownField(change.field.clone()));
        };
        let converted = convert_explicit(series, change.logical_type);
        tracing::debug!(
            field = %change.field,
            to = %change.logical_type,
            dtype = %converted.dtype,
            "explicit conversion"
        );
        *series = converted;
    }

    for series in frame.columns_mut() {
        if series.dtype != Dtype::Object || explicit.iter().any(|c| c.field == series.name) {
            continue;
        }

        if let Some(converted) = infer_column(series, options.errors_rate) {
            tracing::debug!(field = %series.name, dtype = %converted.dtype, "inferred type");
            *series = converted;
        }

        if let Some(category) = to_category(series, options.category_unique_percent) {
            tracing::debug!(field = %series.name, "inferred category");
            *series = category;
        }
    }

    Ok(frame)
}

fn convert_explicit(series: &Series, target: LogicalType) -> Series {
    match target {
        LogicalType::Text => series.with_values(Dtype::Object, series.values.clone()),
        LogicalType::Number => to_numeric(series),
        LogicalType::Complex => to_complex_coerced(series),
        LogicalType::Date => {
            to_datetime(series, 1.0).unwrap_or_else(|| all_missing(series, Dtype::DateTime { utc: false }))
        }
        LogicalType::Duration => to_timedelta(series),
        LogicalType::Category => series.with_values(Dtype::Category, series.values.clone()),
    }
}

fn infer_column(series: &Series, errors_rate: f64) -> Option<Series> {
    let accept = |s: Series| (s.missing_ratio() <= errors_rate).then_some(s);

    accept(to_numeric(series))
        .or_else(|| try_complex(series).and_then(accept))
        .or_else(|| to_datetime(series, errors_rate))
        .or_else(|| accept(to_timedelta(series)))
}

fn all_missing(series: &Series, dtype: Dtype) -> Series {
    series.with_values(dtype, vec![Scalar::Missing; series.len()])
}

/// Numeric coercion; anything unparseable becomes missing
fn to_numeric(series: &Series) -> Series {
    let values: Vec<Scalar> = series
        .values
        .iter()
        .map(|value| match value {
            Scalar::Str(s) => match parse_number(s) {
                Some(Num::Int(i)) => Scalar::Int(i),
                Some(Num::Float(f)) => Scalar::float(f),
                None => Scalar::Missing,
            },
            Scalar::Bool(b) => Scalar::Int(i64::from(*b)),
            Scalar::DateTime(dt) => dt.timestamp_nanos_opt().map_or(Scalar::Missing, Scalar::Int),
            Scalar::Timedelta(ns) => Scalar::Int(*ns),
            other => other.clone(),
        })
        .collect();

    if values.iter().any(|v| matches!(v, Scalar::Complex { .. })) {
        return series.with_values(Dtype::Complex128, widen_to_complex(values));
    }

    let all_int = values.iter().all(|v| matches!(v, Scalar::Int(_)));
    if all_int && !values.is_empty() {
        return series.with_values(Dtype::Int64, values);
    }

    let floats = values
        .into_iter()
        .map(|v| match v {
            Scalar::Int(i) => Scalar::Float(i as f64),
            other => other,
        })
        .collect();
    series.with_values(Dtype::Float64, floats)
}

fn widen_to_complex(values: Vec<Scalar>) -> Vec<Scalar> {
    values
        .into_iter()
        .map(|v| match v {
            Scalar::Int(i) => Scalar::Complex {
                re: i as f64,
                im: 0.0,
            },
            Scalar::Float(f) => Scalar::Complex { re: f, im: 0.0 },
            Scalar::Complex { re, im } => Scalar::Complex { re, im },
            _ => Scalar::Missing,
        })
        .collect()
}

/// Numeric coercion widened to complex. Complex literals do not survive.
fn to_complex_coerced(series: &Series) -> Series {
    let numeric = to_numeric(series);
    series.with_values(Dtype::Complex128, widen_to_complex(numeric.values))
}

/// Parse `a+bj` style text. Any value already missing rules the column out.
fn try_complex(series: &Series) -> Option<Series> {
    let mut values = Vec::with_capacity(series.len());
    for value in &series.values {
        let Scalar::Str(s) = value else {
            return None;
        };
        values.push(match parse_complex(s) {
            Some((re, im)) => Scalar::Complex { re, im },
            None => Scalar::Missing,
        });
    }
    Some(series.with_values(Dtype::Complex128, values))
}

/// The one format every parseable value agrees on. `Err(())` when values
/// disagree.
fn consistent_date_format(series: &Series) -> Result<Option<&'static str>, ()> {
    let mut common = None;
    for value in &series.values {
        let Scalar::Str(s) = value else {
            continue;
        };
        let Some(format) = detect_date_format(s) else {
            continue;
        };
        match common {
            None => common = Some(format),
            Some(seen) if seen != format => return Err(()),
            Some(_) => {}
        }
    }
    Ok(common)
}

fn epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    let nanos = (seconds * NANOS_PER_SEC as f64).round();
    if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(Utc.timestamp_nanos(nanos as i64))
}

fn as_seconds(value: &Scalar) -> Option<f64> {
    match value {
        Scalar::Int(i) => Some(*i as f64),
        Scalar::Float(f) => Some(*f),
        Scalar::Str(s) => parse_number(s).map(Num::as_f64),
        _ => None,
    }
}

/// Datetime conversion: one consistent format, else numbers as epoch
/// seconds, else mixed layouts read as UTC.
fn to_datetime(series: &Series, errors_rate: f64) -> Option<Series> {
    if matches!(series.dtype, Dtype::DateTime { .. }) {
        return Some(series.clone());
    }
    let accept = |s: Series| (s.missing_ratio() <= errors_rate).then_some(s);
    let in_range = |dt: DateTime<Utc>| in_timestamp_range(&dt).then_some(dt);

    if let Ok(Some(format)) = consistent_date_format(series) {
        let mut aware = false;
        let values = series
            .values
            .iter()
            .map(|value| match value {
                Scalar::Str(s) => strptime(s, format)
                    .and_then(|(dt, tz)| {
                        aware |= tz;
                        in_range(dt)
                    })
                    .map_or(Scalar::Missing, Scalar::DateTime),
                _ => Scalar::Missing,
            })
            .collect();
        let converted = series.with_values(Dtype::DateTime { utc: aware }, values);
        if let Some(converted) = accept(converted) {
            return Some(converted);
        }
    }

    if series.values.iter().any(|v| as_seconds(v).is_some()) {
        let values = series
            .values
            .iter()
            .map(|value| {
                as_seconds(value)
                    .and_then(epoch_seconds)
                    .map_or(Scalar::Missing, Scalar::DateTime)
            })
            .collect();
        let converted = series.with_values(Dtype::DateTime { utc: false }, values);
        if let Some(converted) = accept(converted) {
            return Some(converted);
        }
    }

    let values = series
        .values
        .iter()
        .map(|value| match value {
            Scalar::Str(s) => parse_datetime_mixed(s)
                .and_then(in_range)
                .map_or(Scalar::Missing, Scalar::DateTime),
            _ => Scalar::Missing,
        })
        .collect();
    accept(series.with_values(Dtype::DateTime { utc: true }, values))
}

/// Timedelta coercion; bare numbers count nanoseconds
fn to_timedelta(series: &Series) -> Series {
    let values = series
        .values
        .iter()
        .map(|value| match value {
            Scalar::Str(s) => parse_timedelta(s).map_or(Scalar::Missing, Scalar::Timedelta),
            Scalar::Int(i) => Scalar::Timedelta(*i),
            Scalar::Float(f) if f.is_finite() => Scalar::Timedelta(f.round() as i64),
            Scalar::Timedelta(ns) => Scalar::Timedelta(*ns),
            _ => Scalar::Missing,
        })
        .collect();
    series.with_values(Dtype::Timedelta, values)
}

/// Category when distinct non-missing values are at most `max_percent` of
/// the non-missing ones
fn to_category(series: &Series, max_percent: f64) -> Option<Series> {
    let present: Vec<String> = series
        .values
        .iter()
        .filter(|v| !v.is_missing())
        .map(|v| series.render(v))
        .collect();
    if present.is_empty() {
        return None;
    }

    let distinct = present.iter().collect::<HashSet<_>>().len();
    let percent = distinct as f64 / present.len() as f64 * 100.0;
    (percent <= max_percent).then(|| series.with_values(Dtype::Category, series.values.clone()))
}
