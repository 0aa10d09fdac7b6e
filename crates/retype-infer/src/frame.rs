//! In-memory table: named, typed columns of scalars

use std::fmt;

use chrono::{DateTime, Utc};

/// Nanoseconds per second
pub(crate) const NANOS_PER_SEC: i64 = 1_000_000_000;

/// One value in a series
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Missing value (NaN, NaT, None)
    Missing,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Complex { re: f64, im: f64 },
    DateTime(DateTime<Utc>),
    /// Elapsed time in nanoseconds
    Timedelta(i64),
}

impl Scalar {
    /// Check if the value is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, Scalar::Missing)
    }

    /// Float, with NaN normalized to missing
    pub fn float(value: f64) -> Self {
        if value.is_nan() {
            Scalar::Missing
        } else {
            Scalar::Float(value)
        }
    }
}

/// Storage type of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dtype {
    Object,
    Int64,
    Float64,
    Bool,
    Complex128,
    /// `utc` marks a timezone-aware column
    DateTime { utc: bool },
    Timedelta,
    /// Low-cardinality wrapper; values keep their underlying shape
    Category,
}

impl Dtype {
    /// Physical type name reported to clients
    pub fn name(&self) -> &'static str {
        match self {
            Dtype::Object => "object",
            Dtype::Int64 => "int64",
            Dtype::Float64 => "float64",
            Dtype::Bool => "bool",
            Dtype::Complex128 => "complex128",
            Dtype::DateTime { utc: false } => "datetime64[ns]",
            Dtype::DateTime { utc: true } => "datetime64[ns, UTC]",
            Dtype::Timedelta => "timedelta64[ns]",
            Dtype::Category => "category",
        }
    }

    /// Text shown for a missing value of this type
    fn missing_text(&self) -> &'static str {
        match self {
            Dtype::DateTime { .. } | Dtype::Timedelta => "NaT",
            _ => "nan",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub dtype: Dtype,
    pub values: Vec<Scalar>,
}

impl Series {
    pub fn new<S: Into<String>>(name: S, dtype: Dtype, values: Vec<Scalar>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Share of missing values, 0 for an empty series
    pub fn missing_ratio(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let missing = self.values.iter().filter(|v| v.is_missing()).count();
        missing as f64 / self.values.len() as f64
    }

    /// Same name, new type and values
    pub fn with_values(&self, dtype: Dtype, values: Vec<Scalar>) -> Self {
        Self::new(self.name.clone(), dtype, values)
    }

    /// Text rendering of one value, as used for width hints
    pub fn render(&self, value: &Scalar) -> String {
        match value {
            Scalar::Missing => self.dtype.missing_text().to_string(),
            Scalar::Str(s) => s.clone(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => float_repr(*f),
            Scalar::Bool(true) => "True".to_string(),
            Scalar::Bool(false) => "False".to_string(),
            Scalar::Complex { re, im } => complex_repr(*re, *im),
            Scalar::DateTime(dt) => {
                if matches!(self.dtype, Dtype::DateTime { utc: true }) {
                    dt.format("%Y-%m-%d %H:%M:%S%:z").to_string()
                } else {
                    dt.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            Scalar::Timedelta(ns) => timedelta_repr(*ns),
        }
    }

    /// Longest rendered value, in characters
    pub fn char_width(&self) -> u64 {
        self.values
            .iter()
            .map(|v| self.render(v).chars().count() as u64)
            .max()
            .unwrap_or(0)
    }
}

/// A table of equally long series
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<Series>,
}

impl Frame {
    pub fn new(columns: Vec<Series>) -> Self {
        Self { columns }
    }

    /// Columns in order
    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    /// Mutable access to columns in order
    pub fn columns_mut(&mut self) -> &mut [Series] {
        &mut self.columns
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Option<&Series> {
        self.columns.iter().find(|s| s.name == name)
    }

    /// Mutable column by name
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Series> {
        self.columns.iter_mut().find(|s| s.name == name)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Series::len)
    }

    /// Check if there are no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.row_count() == 0
    }
}

pub(crate) fn float_repr(f: f64) -> String {
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

fn complex_repr(re: f64, im: f64) -> String {
    let part = |v: f64| {
        if v.fract() == 0.0 && v.abs() < 1e16 {
            format!("{}", v as i64)
        } else {
            format!("{}", v)
        }
    };
    if re == 0.0 {
        return format!("{}j", part(im));
    }
    let sign = if im < 0.0 { '-' } else { '+' };
    format!("({}{}{}j)", part(re), sign, part(im.abs()))
}

fn timedelta_repr(ns: i64) -> String {
    let negative = ns < 0;
    let total = ns.unsigned_abs();
    let nanos_per_sec = NANOS_PER_SEC as u64;
    let secs = total / nanos_per_sec;
    let frac = total % nanos_per_sec;
    let days = secs / 86_400;
    let rem = secs % 86_400;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&format!(
        "{} days {:02}:{:02}:{:02}",
        days,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    ));
    if frac > 0 {
        let digits = format!("{:09}", frac);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}
