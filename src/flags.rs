//! Byte-level classification tables driving the parser's dispatch.

/// The closed set of byte classifications the state machine dispatches on.
///
/// `QuoteEscapeQuote` is never stored in a table; it's a state-dependent
/// reclassification of [`ParseFlags::Quote`] applied only while the parser
/// is inside a quoted field (see [`compound_parse_flag`]).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ParseFlags {
    /// An ordinary byte, part of field content.
    NotSpecial,
    /// The configured quote byte.
    Quote,
    /// The first byte of the configured delimiter.
    Delimiter,
    /// `\n` or `\r`.
    Newline,
    /// A quote byte encountered while already inside a quoted field.
    QuoteEscapeQuote,
}

/// A 256-entry byte → [`ParseFlags`] lookup table.
///
/// Only the delimiter's *lead* byte is classified here; when the delimiter
/// spans multiple UTF-8 bytes, the parser confirms the full code point
/// separately (see `compound_parse_flag` in `parser.rs`). A lead-byte match
/// in this table is therefore not, by itself, a definitive delimiter match.
#[derive(Clone)]
pub struct FlagTable([ParseFlags; 256]);

impl FlagTable {
    #[inline]
    pub fn get(&self, byte: u8) -> ParseFlags {
        self.0[byte as usize]
    }
}

/// A 256-entry byte → bool lookup table marking which bytes trim as whitespace.
#[derive(Clone)]
pub struct WhitespaceTable([bool; 256]);

impl WhitespaceTable {
    #[inline]
    pub fn is_whitespace(&self, byte: u8) -> bool {
        self.0[byte as usize]
    }
}

/// Builds the parse-flag table for a given delimiter lead byte and quote byte.
///
/// `\n` and `\r` always classify as [`ParseFlags::Newline`]. When
/// `quote` is `None` (the `no_quote` format option), the quote byte - if any
/// is still supplied for informational purposes - is never installed as
/// [`ParseFlags::Quote`], so it parses as ordinary field content.
pub fn make_parse_flags(delimiter_lead_byte: u8, quote: Option<u8>) -> FlagTable {
    let mut table = [ParseFlags::NotSpecial; 256];
    table[delimiter_lead_byte as usize] = ParseFlags::Delimiter;
    table[b'\n' as usize] = ParseFlags::Newline;
    table[b'\r' as usize] = ParseFlags::Newline;
    if let Some(q) = quote {
        table[q as usize] = ParseFlags::Quote;
    }
    FlagTable(table)
}

/// Builds the whitespace table from a set of single-byte trim characters.
pub fn make_ws_flags(trim_chars: &[u8]) -> WhitespaceTable {
    let mut table = [false; 256];
    for &b in trim_chars {
        table[b as usize] = true;
    }
    WhitespaceTable(table)
}
