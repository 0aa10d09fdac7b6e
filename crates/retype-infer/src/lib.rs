//! # retype-infer
//!
//! Reading uploaded tables, inferring column types and encoding the result
//! as the response a retype client consumes.

mod encode;
mod error;
mod frame;
mod infer;
mod options;
mod parse;
mod reader;

pub use encode::encode;
pub use error::{InferError, InferResult};
pub use frame::{Dtype, Frame, Scalar, Series};
pub use infer::infer_and_convert;
pub use options::{CsvReadOptions, InferOptions, DEFAULT_NA_VALUES};
pub use parse::{parse_complex, parse_timedelta};
pub use reader::{is_binary, CsvReader};
