//! Encoding a converted frame as an upload response

use retype_core::{RawColumnDef, UploadResponse};
use serde_json::{json, Map, Number, Value};

use crate::error::InferResult;
use crate::frame::{Dtype, Frame, Scalar, Series, NANOS_PER_SEC};

/// Column definitions plus the rows as a JSON records string
pub fn encode(frame: &Frame) -> InferResult<UploadResponse> {
    let columns_def = frame
        .columns()
        .iter()
        .map(|series| {
            RawColumnDef::new(series.name.clone(), series.dtype.name())
                .with_width(series.char_width())
        })
        .collect();

    let rows: Vec<Value> = (0..frame.row_count())
        .map(|row| {
            let record: Map<String, Value> = frame
                .columns()
                .iter()
                .map(|series| (series.name.clone(), encode_value(series, &series.values[row])))
                .collect();
            Value::Object(record)
        })
        .collect();

    let data = serde_json::to_string(&rows)?;
    tracing::debug!(rows = rows.len(), bytes = data.len(), "encoded response");
    Ok(UploadResponse { columns_def, data })
}

fn encode_value(series: &Series, value: &Scalar) -> Value {
    match value {
        Scalar::Missing => Value::Null,
        Scalar::Str(s) => Value::String(s.clone()),
        Scalar::Int(i) => Value::from(*i),
        Scalar::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Complex { re, im } => json!({
            "real": Number::from_f64(*re).map_or(Value::Null, Value::Number),
            "imag": Number::from_f64(*im).map_or(Value::Null, Value::Number),
        }),
        Scalar::DateTime(dt) => {
            let text = dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string();
            if matches!(series.dtype, Dtype::DateTime { utc: false }) {
                Value::String(text)
            } else {
                Value::String(text + "Z")
            }
        }
        Scalar::Timedelta(ns) => Value::String(iso_duration(*ns)),
    }
}

/// `P{d}DT{h}H{m}M{s}S`, with fractional seconds when present
fn iso_duration(ns: i64) -> String {
    let sign = if ns < 0 { "-" } else { "" };
    let total = ns.unsigned_abs();
    let nanos_per_sec = NANOS_PER_SEC as u64;
    let secs = total / nanos_per_sec;
    let frac = total % nanos_per_sec;

    let days = secs / 86_400;
    let hours = secs % 86_400 / 3600;
    let minutes = secs % 3600 / 60;
    let seconds = secs % 60;

    let mut out = format!("{sign}P{days}DT{hours}H{minutes}M{seconds}");
    if frac > 0 {
        let digits = format!("{:09}", frac);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out.push('S');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::infer_and_convert;
    use crate::options::{CsvReadOptions, InferOptions};
    use crate::reader::CsvReader;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use retype_core::IsoDuration;

    #[test]
    fn test_iso_duration() {
        assert_eq!(iso_duration(5400 * NANOS_PER_SEC), "P0DT1H30M0S");
        assert_eq!(
            iso_duration((102 * 3600 + 30 * 60 + 50) * NANOS_PER_SEC),
            "P4DT6H30M50S"
        );
        assert_eq!(iso_duration(1_500_000_000), "P0DT0H0M1.5S");
        assert!(IsoDuration::is_valid(&iso_duration(942 * NANOS_PER_SEC)));
    }

    #[test]
    fn test_encode_values() {
        let dt = Utc.with_ymd_and_hms(2023, 9, 15, 17, 30, 45).unwrap();
        let aware = Series::new("a", Dtype::DateTime { utc: true }, vec![]);
        let naive = Series::new("n", Dtype::DateTime { utc: false }, vec![]);
        assert_eq!(
            encode_value(&aware, &Scalar::DateTime(dt)),
            json!("2023-09-15T17:30:45.000Z")
        );
        assert_eq!(
            encode_value(&naive, &Scalar::DateTime(dt)),
            json!("2023-09-15T17:30:45.000")
        );

        let complex = Series::new("c", Dtype::Complex128, vec![]);
        assert_eq!(
            encode_value(&complex, &Scalar::Complex { re: 2.0, im: 3.33 }),
            json!({"real": 2.0, "imag": 3.33})
        );
        assert_eq!(encode_value(&complex, &Scalar::Missing), Value::Null);

        let floats = Series::new("f", Dtype::Float64, vec![]);
        assert_eq!(encode_value(&floats, &Scalar::Float(f64::INFINITY)), Value::Null);
    }

    #[test]
    fn test_encode_frame() {
        let csv = "Score,Grade\n75,A\nNot Available,B\n85,A\n70,A\n90,B\n100,A\n";
        let frame = CsvReader::read(csv.as_bytes(), &CsvReadOptions::default()).unwrap();
        let frame = infer_and_convert(frame, &[], &InferOptions::default()).unwrap();
        let response = encode(&frame).unwrap();

        assert_eq!(
            response.columns_def,
            vec![
                RawColumnDef::new("Score", "float64").with_width(5),
                RawColumnDef::new("Grade", "category").with_width(1),
            ]
        );

        let rows = response.rows().unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0]["Score"], json!(75.0));
        assert_eq!(rows[1]["Score"], Value::Null);
        assert_eq!(rows[1]["Grade"], json!("B"));
    }
}
