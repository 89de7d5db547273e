//! `streamcsv` is a chunked, lazy-decoding, zero-copy CSV parser for
//! streaming inputs too large to hold in memory at once.
//!
//! # Primary Focuses
//!
//! - **Chunked**: the parser consumes one bounded chunk of bytes at a time
//!   via a [`ChunkSource`]; a row that spans a chunk boundary is simply
//!   re-parsed once the next chunk arrives, so memory use is bounded by the
//!   chunk size plus whatever rows the caller is still holding onto.
//! - **Zero-copy by default**: fields are views into the chunk's own backing
//!   buffer. Unquoting and numeric parsing only happen when a caller asks
//!   for them.
//! - **Lazy decoding**: `is_int`/`is_float`/`get::<T>()` parse the raw bytes
//!   on demand, not while the row is being assembled.
//! - **UTF-8 resilient**: malformed byte sequences are substituted with
//!   `U+FFFD` and parsing continues; see [`Reader::had_utf8_errors`] and
//!   [`Reader::utf8_error_count`].
//!
//! # Supported Features
//!
//! `streamcsv` supports a superset of [RFC 4180](https://datatracker.ietf.org/doc/html/rfc4180):
//!
//! - Double-quote escaping (`""` within a quoted field) and multi-line
//!   quoted fields.
//! - `\n`, `\r\n`, and `\n\r` are all accepted as a single line ending.
//! - A UTF-8 byte order mark at the very start of the stream is stripped.
//! - The delimiter may be any Unicode code point, including multi-byte ones.
//! - Configurable per-field whitespace trimming, header row position, and
//!   behavior when a row's column count disagrees with the header's.
//!
//! # Examples
//!
//! ```
//! use streamcsv::{Format, Reader};
//!
//! let data = b"name,age\nalice,30\nbob,25\n";
//! let reader = Reader::from_slice(data, Format::default(), 4096)?;
//! for row in reader {
//!     let row = row?;
//!     let name = row.get_by_name("name")?.as_str()?;
//!     let age: i64 = row.get_by_name("age")?.get()?;
//!     println!("{name} is {age}");
//! }
//! # Ok::<(), streamcsv::CsvError>(())
//! ```
//!
//! Parsing a large file without loading it whole, in fixed-size chunks read
//! straight off disk:
//!
//! ```no_run
//! use std::fs::File;
//! use streamcsv::{Format, Reader};
//!
//! let file = File::open("large.csv")?;
//! let reader = Reader::from_reader(file, Format::default(), 64 * 1024)?;
//! for row in reader {
//!     let row = row?;
//!     // ...
//! }
//! # Ok::<(), streamcsv::CsvError>(())
//! ```

mod buffer;
mod chunk;
mod error;
mod flags;
mod format;
mod parser;
mod reader;
mod row;
mod utf8;

pub use buffer::ColNames;
pub use chunk::{Chunk, ChunkSource, ReadChunkSource, SliceChunkSource};
pub use error::CsvError;
pub use format::{Format, FormatBuilder, HeaderRow, VariableColumnPolicy};
pub use reader::Reader;
pub use row::{Field, FromField, Row, RowIter};
