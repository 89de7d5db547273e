//! Error type unifying chunk-source I/O failures with accessor-level failures.

use std::io;

/// Errors produced while reading or accessing a CSV stream.
#[derive(thiserror::Error, Debug)]
pub enum CsvError {
    /// The underlying chunk source failed to produce more bytes.
    #[error("csv io error: {0}")]
    Io(#[from] io::Error),

    /// A byte sequence failed UTF-8 decoding. The parser itself never
    /// returns this variant - a malformed sequence is recovered from
    /// locally via `U+FFFD` substitution and observed only through
    /// [`crate::Reader::had_utf8_errors`]/[`crate::Reader::utf8_error_count`].
    /// Reserved for callers building their own [`crate::ChunkSource`] who
    /// need to surface a decoding problem through the same error type rather
    /// than inventing a second one.
    #[error("invalid utf-8 sequence at byte offset {offset}")]
    Utf8Error {
        /// The byte offset within the field or chunk where decoding failed.
        offset: usize,
    },

    /// Name-based field access used a header name that doesn't exist.
    #[error("unknown column: {name:?}")]
    UnknownColumn {
        /// The name that was looked up.
        name: String,
    },

    /// Index-based field access went past the row's field count.
    #[error("field index {index} out of range (row has {field_count} fields)")]
    OutOfRange {
        /// The index that was requested.
        index: usize,
        /// The number of fields actually present in the row.
        field_count: usize,
    },

    /// A numeric or string coercion via [`crate::Field::get`] failed.
    #[error("field {raw:?} could not be coerced to the requested type")]
    TypeMismatch {
        /// The raw bytes that failed to coerce, rendered lossily for display.
        raw: String,
    },

    /// Under [`crate::VariableColumnPolicy::Strict`], a row's field count
    /// disagreed with the header's.
    #[error("row has {actual} fields, but header has {expected}")]
    MalformedRow {
        /// The header's field count.
        expected: usize,
        /// The row's actual field count.
        actual: usize,
    },

    /// The format configuration itself was invalid (see [`crate::FormatBuilder::build`]).
    #[error("invalid csv format: {0}")]
    InvalidFormat(&'static str),
}
