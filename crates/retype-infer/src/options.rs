//! Reading and inference options

/// Cell texts read as missing values
pub const DEFAULT_NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Options for reading CSV files
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Cell texts that mean "missing"
    pub na_values: Vec<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            na_values: DEFAULT_NA_VALUES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CsvReadOptions {
    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub(crate) fn is_na(&self, text: &str) -> bool {
        self.na_values.iter().any(|na| na == text)
    }
}

/// Options for type inference
#[derive(Debug, Clone)]
pub struct InferOptions {
    /// Largest share of missing values a conversion may produce and still be
    /// accepted during inference (explicit conversions ignore it)
    pub errors_rate: f64,
    /// Largest share of distinct values, in percent, for a column to become
    /// a category
    pub category_unique_percent: f64,
}

impl Default for InferOptions {
    fn default() -> Self {
        Self {
            errors_rate: 0.2,
            category_unique_percent: 50.0,
        }
    }
}
