//! Immutable parser configuration.

use crate::error::CsvError;
use crate::flags::{make_parse_flags, make_ws_flags, FlagTable, WhitespaceTable};

/// 0-based index of the header row, or "no header".
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum HeaderRow {
    /// The row at this index supplies column names; it is not itself yielded
    /// to the caller.
    Index(usize),
    /// No row is treated as a header; [`crate::ColNames`] stays empty and
    /// name-based field access always fails.
    None,
}

/// Behavior when a row's field count differs from the header's.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum VariableColumnPolicy {
    /// Surface a [`CsvError::MalformedRow`] for the offending row.
    Strict,
    /// Keep the row as-is; index-based access past its field count still
    /// fails with [`CsvError::OutOfRange`].
    #[default]
    Keep,
    /// Silently drop rows whose field count disagrees with the header's.
    Ignore,
}

/// Immutable parser configuration.
///
/// Construct with [`FormatBuilder`]; `Format::default()` matches RFC 4180's
/// comma-separated, double-quote-escaped defaults.
#[derive(Clone)]
pub struct Format {
    pub(crate) delimiter: char,
    pub(crate) quote: u8,
    pub(crate) quoting_enabled: bool,
    pub(crate) trim_chars: Vec<u8>,
    pub(crate) header_row: HeaderRow,
    pub(crate) variable_column_policy: VariableColumnPolicy,
    pub(crate) null_values: Vec<String>,
    pub(crate) parse_flags: FlagTable,
    pub(crate) ws_flags: WhitespaceTable,
}

impl Default for Format {
    fn default() -> Self {
        FormatBuilder::new().build().expect("default format is valid")
    }
}

impl Format {
    /// The configured field delimiter, as a Unicode code point.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The configured quote byte.
    pub fn quote(&self) -> u8 {
        self.quote
    }

    /// Whether quoting is enabled.
    pub fn quoting_enabled(&self) -> bool {
        self.quoting_enabled
    }

    /// The configured header row position.
    pub fn header_row(&self) -> HeaderRow {
        self.header_row
    }

    /// The configured variable-column-count policy.
    pub fn variable_column_policy(&self) -> VariableColumnPolicy {
        self.variable_column_policy
    }

    pub(crate) fn delimiter_lead_byte(&self) -> u8 {
        let mut buf = [0u8; 4];
        self.delimiter.encode_utf8(&mut buf).as_bytes()[0]
    }

    pub(crate) fn delimiter_is_multibyte(&self) -> bool {
        self.delimiter.len_utf8() > 1
    }

    pub(crate) fn is_null_value(&self, raw: &[u8]) -> bool {
        if raw.is_empty() {
            return self.null_values.iter().any(|v| v.is_empty());
        }
        match std::str::from_utf8(raw) {
            Ok(s) => self.null_values.iter().any(|v| v == s),
            Err(_) => false,
        }
    }
}

/// Chainable builder for [`Format`].
pub struct FormatBuilder {
    delimiter: char,
    quote: u8,
    quoting_enabled: bool,
    trim_chars: Vec<u8>,
    header_row: HeaderRow,
    variable_column_policy: VariableColumnPolicy,
    null_values: Vec<String>,
}

impl Default for FormatBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatBuilder {
    /// Starts from RFC 4180 defaults: `,` delimiter, `"` quote, quoting
    /// enabled, no trimming, header at row 0, `keep` column-count policy,
    /// empty string recognized as null.
    pub fn new() -> Self {
        Self {
            delimiter: ',',
            quote: b'"',
            quoting_enabled: true,
            trim_chars: Vec::new(),
            header_row: HeaderRow::Index(0),
            variable_column_policy: VariableColumnPolicy::Keep,
            null_values: vec![String::new()],
        }
    }

    /// Sets the field delimiter. May be multi-byte when UTF-8 encoded.
    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets the quote byte.
    #[must_use]
    pub fn quote(mut self, quote: u8) -> Self {
        self.quote = quote;
        self
    }

    /// Disables quoting entirely; the quote byte parses as ordinary content.
    #[must_use]
    pub fn no_quote(mut self) -> Self {
        self.quoting_enabled = false;
        self
    }

    /// Sets the set of single-byte characters trimmed from field edges.
    #[must_use]
    pub fn trim_chars(mut self, trim_chars: impl Into<Vec<u8>>) -> Self {
        self.trim_chars = trim_chars.into();
        self
    }

    /// Sets the header row position.
    #[must_use]
    pub fn header_row(mut self, header_row: HeaderRow) -> Self {
        self.header_row = header_row;
        self
    }

    /// Sets the variable-column-count policy.
    #[must_use]
    pub fn variable_column_policy(mut self, policy: VariableColumnPolicy) -> Self {
        self.variable_column_policy = policy;
        self
    }

    /// Sets the set of literal strings recognized by [`crate::Field::is_null`].
    /// Replaces the default (`{""}`) entirely.
    #[must_use]
    pub fn null_values(mut self, null_values: impl Into<Vec<String>>) -> Self {
        self.null_values = null_values.into();
        self
    }

    /// Validates the configuration and builds the immutable [`Format`],
    /// precomputing its flag tables.
    pub fn build(self) -> Result<Format, CsvError> {
        let mut delim_buf = [0u8; 4];
        let delim_bytes = self.delimiter.encode_utf8(&mut delim_buf).as_bytes();
        let delim_lead = delim_bytes[0];

        if self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(CsvError::InvalidFormat("delimiter must not be a newline"));
        }
        if self.quoting_enabled && delim_lead == self.quote {
            return Err(CsvError::InvalidFormat(
                "delimiter and quote must not share a lead byte",
            ));
        }
        if self.quote == b'\n' || self.quote == b'\r' {
            return Err(CsvError::InvalidFormat("quote must not be a newline byte"));
        }
        for &b in &self.trim_chars {
            if b == delim_lead || b == self.quote || b == b'\n' || b == b'\r' {
                return Err(CsvError::InvalidFormat(
                    "trim_chars must not include the delimiter, quote, or a newline byte",
                ));
            }
        }

        let parse_flags = make_parse_flags(
            delim_lead,
            if self.quoting_enabled { Some(self.quote) } else { None },
        );
        let ws_flags = make_ws_flags(&self.trim_chars);

        Ok(Format {
            delimiter: self.delimiter,
            quote: self.quote,
            quoting_enabled: self.quoting_enabled,
            trim_chars: self.trim_chars,
            header_row: self.header_row,
            variable_column_policy: self.variable_column_policy,
            null_values: self.null_values,
            parse_flags,
            ws_flags,
        })
    }
}
