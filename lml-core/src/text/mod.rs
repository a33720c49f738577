//! The text format: human-readable grammar and its canonical writer.

pub mod parser;
pub mod serializer;

pub use parser::{parse_text, parse_text_with_report, DegradedSpan};
pub use serializer::{serialize, serialize_with_options, SerializeOptions};
