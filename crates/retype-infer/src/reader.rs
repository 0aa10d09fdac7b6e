//! CSV reader

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{InferError, InferResult};
use crate::frame::{Dtype, Frame, Scalar, Series};
use crate::options::CsvReadOptions;
use crate::parse::{parse_number, Num};

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a frame
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> InferResult<Frame> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into a frame.
    ///
    /// The first record names the columns. Columns that are entirely numeric
    /// or boolean are typed on read; everything else stays `object` for
    /// inference to look at.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> InferResult<Frame> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let names = unique_names(csv_reader.headers()?.iter());
        if names.is_empty() {
            return Err(InferError::Empty);
        }

        let mut raw: Vec<Vec<Scalar>> = vec![Vec::new(); names.len()];
        for result in csv_reader.records() {
            let record = result?;
            // blank lines
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            for (col, values) in raw.iter_mut().enumerate() {
                let value = match record.get(col) {
                    Some(field) if !options.is_na(field) && !options.is_na(field.trim()) => {
                        Scalar::Str(field.to_string())
                    }
                    _ => Scalar::Missing,
                };
                values.push(value);
            }
        }

        let frame = Frame::new(
            names
                .into_iter()
                .zip(raw)
                .map(|(name, values)| type_on_read(name, values))
                .collect(),
        );
        if frame.is_empty() {
            return Err(InferError::Empty);
        }

        tracing::debug!(
            columns = frame.columns().len(),
            rows = frame.row_count(),
            "read csv"
        );
        Ok(frame)
    }
}

/// Check whether uploaded bytes look like a binary file
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.contains(&0)
}

/// Repeated header names get a `.N` suffix
fn unique_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    for header in headers {
        let mut name = header.to_string();
        let mut n = 1;
        while !seen.insert(name.clone()) {
            name = format!("{header}.{n}");
            n += 1;
        }
        names.push(name);
    }
    names
}

fn type_on_read(name: String, values: Vec<Scalar>) -> Series {
    let present: Vec<&str> = values
        .iter()
        .filter_map(|v| match v {
            Scalar::Str(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    let any_missing = present.len() < values.len();

    if present.is_empty() {
        return Series::new(name, Dtype::Float64, values);
    }

    let numbers: Option<Vec<Num>> = present.iter().map(|s| parse_number(s)).collect();
    if let Some(numbers) = numbers {
        let all_int = numbers.iter().all(|n| matches!(n, Num::Int(_)));
        let mut parsed = numbers.into_iter();
        if all_int && !any_missing {
            let values = parsed
                .map(|n| match n {
                    Num::Int(i) => Scalar::Int(i),
                    Num::Float(f) => Scalar::float(f),
                })
                .collect();
            return Series::new(name, Dtype::Int64, values);
        }
        let values = values
            .into_iter()
            .map(|v| match v {
                Scalar::Str(_) => parsed
                    .next()
                    .map_or(Scalar::Missing, |n| Scalar::float(n.as_f64())),
                _ => Scalar::Missing,
            })
            .collect();
        return Series::new(name, Dtype::Float64, values);
    }

    if !any_missing {
        let bools: Option<Vec<bool>> = present.iter().map(|s| parse_bool(s)).collect();
        if let Some(bools) = bools {
            let values = bools.into_iter().map(Scalar::Bool).collect();
            return Series::new(name, Dtype::Bool, values);
        }
    }

    Series::new(name, Dtype::Object, values)
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim() {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn read(text: &str) -> Frame {
        CsvReader::read(text.as_bytes(), &CsvReadOptions::default()).unwrap()
    }

    #[test]
    fn test_types_on_read() {
        let frame = read("a,b,c,d,e\n1,1.5,x,True,1\n2,,y,False,\n");
        let dtypes: Vec<Dtype> = frame.columns().iter().map(|s| s.dtype).collect();
        assert_eq!(
            dtypes,
            vec![
                Dtype::Int64,
                Dtype::Float64,
                Dtype::Object,
                Dtype::Bool,
                Dtype::Float64
            ]
        );
        assert_eq!(frame.column("a").unwrap().values[1], Scalar::Int(2));
        assert_eq!(frame.column("b").unwrap().values[1], Scalar::Missing);
        assert_eq!(frame.column("e").unwrap().values[0], Scalar::Float(1.0));
    }

    #[test]
    fn test_missing_markers() {
        let frame = read("Score\n75\nNot Available\nnan\nNA\n");
        let score = frame.column("Score").unwrap();
        assert_eq!(score.dtype, Dtype::Object);
        assert_eq!(
            score.values,
            vec![
                Scalar::Str("75".into()),
                Scalar::Str("Not Available".into()),
                Scalar::Missing,
                Scalar::Missing
            ]
        );
    }

    #[test]
    fn test_ragged_and_blank_rows() {
        let frame = read("a,b\n1,2\n\n3\n   \n");
        assert_eq!(frame.row_count(), 2);
        assert_eq!(frame.column("b").unwrap().values[1], Scalar::Missing);
    }

    #[test]
    fn test_duplicate_headers() {
        let frame = read("a,a,b\n1,2,3\n");
        let names: Vec<&str> = frame.columns().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "a.1", "b"]);
    }

    #[test]
    fn test_empty_input() {
        let err = CsvReader::read("a,b\n".as_bytes(), &CsvReadOptions::default()).unwrap_err();
        assert!(matches!(err, InferError::Empty));
        let err = CsvReader::read("".as_bytes(), &CsvReadOptions::default()).unwrap_err();
        assert!(matches!(err, InferError::Empty));
    }

    #[test]
    fn test_delimiter_option() {
        let options = CsvReadOptions::default().with_delimiter(b';');
        let frame = CsvReader::read("a;b\n1;x\n".as_bytes(), &options).unwrap();
        assert_eq!(frame.columns().len(), 2);
    }

    #[test]
    fn test_read_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Grade\nA\nB\n").unwrap();
        let frame = CsvReader::read_file(file.path(), &CsvReadOptions::default()).unwrap();
        assert_eq!(frame.row_count(), 2);
    }

    #[test]
    fn test_is_binary() {
        assert!(is_binary(b"PK\x03\x04\x00\x00"));
        assert!(!is_binary(b"a,b\n1,2\n"));
    }
}
