//! The chunked parser state machine.
//!
//! A single call to [`parse_chunk`] consumes one chunk's bytes in full,
//! appending completed fields/rows to fresh, exclusively-owned vectors. Any
//! row left unfinished at the end of the chunk is *not* emitted: its start
//! offset is returned so the caller can feed those trailing bytes back in
//! (via [`crate::chunk::ChunkSource::rewind`]) together with the next
//! chunk, at which point this function simply re-parses the row from its
//! very first byte. No parser state therefore needs to survive across
//! calls except whether the UTF-8 BOM has already been checked once.

use crate::buffer::FieldEntry;
use crate::flags::ParseFlags;
use crate::format::Format;
use crate::utf8::next_glyph;

const UNINITIALIZED: usize = usize::MAX;

/// One fully parsed row: a span into the chunk's `fields` vector, plus the
/// absolute byte offset (within the chunk) where the row began.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ParsedRow {
    pub row_start: usize,
    pub fields_start: usize,
    pub field_count: usize,
    /// Whether a byte belonging to this row failed UTF-8 decoding and was
    /// recovered from via `U+FFFD` substitution.
    pub had_utf8_error: bool,
}

/// The result of parsing one chunk.
pub(crate) struct ParseOutcome {
    pub fields: Vec<FieldEntry>,
    pub rows: Vec<ParsedRow>,
    /// Byte offset where the next chunk must resume (start of the last,
    /// incomplete row). Equals `bytes.len()` if every byte was consumed
    /// into a complete row.
    pub tail_start: usize,
}

struct Builder {
    fields: Vec<FieldEntry>,
    rows: Vec<ParsedRow>,
    data_pos: usize,
    field_start: usize, // UNINITIALIZED sentinel, else relative to current_row_start
    field_length: usize,
    quote_escape: bool,
    field_has_escaped_quote: bool,
    current_row_start: usize,
    row_fields_start: usize,
    row_has_utf8_error: bool,
}

impl Builder {
    fn new() -> Self {
        Builder {
            fields: Vec::new(),
            rows: Vec::new(),
            data_pos: 0,
            field_start: UNINITIALIZED,
            field_length: 0,
            quote_escape: false,
            field_has_escaped_quote: false,
            current_row_start: 0,
            row_fields_start: 0,
            row_has_utf8_error: false,
        }
    }

    #[inline]
    fn push_field(&mut self) {
        let start = if self.field_start == UNINITIALIZED { 0 } else { self.field_start };
        self.fields.push(FieldEntry {
            start: start as u32,
            length: self.field_length as u32,
            has_escaped_quote: self.field_has_escaped_quote,
        });
        self.field_start = UNINITIALIZED;
        self.field_length = 0;
        self.field_has_escaped_quote = false;
    }

    #[inline]
    fn push_row(&mut self) {
        self.rows.push(ParsedRow {
            row_start: self.current_row_start,
            fields_start: self.row_fields_start,
            field_count: self.fields.len() - self.row_fields_start,
            had_utf8_error: self.row_has_utf8_error,
        });
        self.row_has_utf8_error = false;
    }

    fn start_new_row(&mut self, at: usize) {
        self.current_row_start = at;
        self.row_fields_start = self.fields.len();
    }
}

/// Parses as much of `bytes` as forms complete rows, appending to fresh
/// vectors. `skip_bom` controls whether a leading UTF-8 BOM is stripped
/// (only meaningful on the very first chunk of a stream). `eof` signals
/// that `bytes` is the final chunk, so any still-pending field/row must be
/// flushed (`end_feed`) rather than held back for a nonexistent next chunk.
pub(crate) fn parse_chunk(bytes: &[u8], format: &Format, skip_bom: bool, eof: bool) -> ParseOutcome {
    let mut b = Builder::new();

    if skip_bom && bytes.len() >= 3 && bytes[0..3] == [0xEF, 0xBB, 0xBF] {
        b.data_pos = 3;
        b.current_row_start = 3;
    }

    let delim_lead = format.delimiter_lead_byte();
    let delim_multibyte = format.delimiter_is_multibyte();
    let quote = format.quote;
    let quoting_enabled = format.quoting_enabled;

    while b.data_pos < bytes.len() {
        let (c, len, decode_error) = next_glyph(bytes, b.data_pos);
        let is_multibyte_glyph = len > 1;
        if decode_error {
            b.row_has_utf8_error = true;
        }

        let flag = compound_parse_flag(bytes, b.data_pos, c, is_multibyte_glyph, delim_multibyte, b.quote_escape, format);

        match flag {
            ParseFlags::Delimiter => {
                b.push_field();
                b.data_pos += len;
            }

            ParseFlags::Newline => {
                b.data_pos += len;
                if b.data_pos < bytes.len() {
                    let (c2, len2, decode_error) = next_glyph(bytes, b.data_pos);
                    if decode_error {
                        b.row_has_utf8_error = true;
                    }
                    if c2 < 0x80 && format.parse_flags.get(c2 as u8) == ParseFlags::Newline {
                        b.data_pos += len2;
                    }
                }
                b.push_field();
                b.push_row();
                let next_row_start = b.data_pos;
                b.start_new_row(next_row_start);
            }

            ParseFlags::NotSpecial => {
                let in_quote = b.quote_escape;
                parse_field(bytes, format, &mut b, delim_lead, quote, quoting_enabled, in_quote);
            }

            ParseFlags::QuoteEscapeQuote => {
                if b.data_pos + len >= bytes.len() {
                    // Can't tell yet whether this quote closes the field or
                    // starts an escaped quote pair; ask for more data.
                    let row_start = b.current_row_start;
                    return finish(b, bytes, format, eof, row_start);
                }
                let (c2, len2, decode_error) = next_glyph(bytes, b.data_pos + len);
                if decode_error {
                    b.row_has_utf8_error = true;
                }
                if b.data_pos + len + len2 > bytes.len() {
                    let row_start = b.current_row_start;
                    return finish(b, bytes, format, eof, row_start);
                }
                let next_flag = compound_parse_flag(bytes, b.data_pos + len, c2, len2 > 1, delim_multibyte, false, format);
                match next_flag {
                    ParseFlags::Delimiter | ParseFlags::Newline => {
                        b.quote_escape = false;
                        b.data_pos += len;
                    }
                    ParseFlags::Quote => {
                        b.data_pos += len + len2;
                        b.field_length += len + len2;
                        b.field_has_escaped_quote = true;
                    }
                    _ => {
                        b.field_length += len;
                        b.data_pos += len;
                    }
                }
            }

            ParseFlags::Quote => {
                if b.field_length == 0 {
                    b.quote_escape = true;
                    b.data_pos += len;
                    if b.field_start == UNINITIALIZED && b.data_pos < bytes.len() {
                        let (c2, _, decode_error) = next_glyph(bytes, b.data_pos);
                        if decode_error {
                            b.row_has_utf8_error = true;
                        }
                        let is_ws = c2 < 0x80 && format.ws_flags.is_whitespace(c2 as u8);
                        if !is_ws {
                            b.field_start = b.data_pos - b.current_row_start;
                        }
                    }
                } else {
                    b.field_length += len;
                    b.data_pos += len;
                }
            }
        }
    }

    let row_start = b.current_row_start;
    finish(b, bytes, format, eof, row_start)
}

/// `tail_start` is always the start offset of the row still in progress
/// when the main loop stopped (mirroring the original `current_row_start`
/// return value) - the bytes from there on belong to a row this call could
/// not finish and must be handed back unparsed, *unless* `eof` says no more
/// input is coming, in which case [`end_feed`] flushes that pending state
/// into a final field/row instead.
fn finish(mut b: Builder, bytes: &[u8], format: &Format, eof: bool, tail_start: usize) -> ParseOutcome {
    if eof {
        end_feed(&mut b, bytes, format);
    }
    ParseOutcome {
        fields: b.fields,
        rows: b.rows,
        tail_start: if eof { bytes.len() } else { tail_start },
    }
}

/// Flushes a trailing field/row at true end-of-input. A trailing delimiter
/// implies one more, empty, final field; a trailing newline does not (the
/// newline branch above already pushed the row, leaving `field_length == 0`
/// and nothing pending).
fn end_feed(b: &mut Builder, bytes: &[u8], format: &Format) {
    let empty_last_field =
        !bytes.is_empty() && b.field_length == 0 && format.parse_flags.get(bytes[bytes.len() - 1]) == ParseFlags::Delimiter;
    if b.field_length > 0 || empty_last_field {
        b.push_field();
    }
    if b.fields.len() > b.row_fields_start {
        b.push_row();
    }
}

/// Reclassifies a byte's raw [`ParseFlags`] according to whether the parser
/// is currently inside a quoted field (`in_quote`). Quotes protect both the
/// delimiter and newline bytes they enclose: while `in_quote`, `Delimiter`
/// and `Newline` demote to `NotSpecial`, and `Quote` promotes to
/// `QuoteEscapeQuote` (the parser must look ahead one glyph to tell a
/// closing quote from an escaped one).
#[inline]
fn compound_parse_flag(
    bytes: &[u8],
    pos: usize,
    c: u32,
    is_multibyte_glyph: bool,
    delim_multibyte: bool,
    in_quote: bool,
    format: &Format,
) -> ParseFlags {
    let base = if is_multibyte_glyph {
        if delim_multibyte && c == format.delimiter as u32 {
            ParseFlags::Delimiter
        } else {
            ParseFlags::NotSpecial
        }
    } else {
        format.parse_flags.get(bytes[pos])
    };
    if in_quote {
        match base {
            ParseFlags::Quote => ParseFlags::QuoteEscapeQuote,
            ParseFlags::Delimiter | ParseFlags::Newline => ParseFlags::NotSpecial,
            other => other,
        }
    } else {
        base
    }
}

/// Consumes a run of ordinary characters: trims leading whitespace, sets
/// `field_start` on the first non-whitespace byte, advances by whole
/// glyphs until a special byte, then trims trailing single-byte whitespace.
///
/// When the format's delimiter and quote are both single ASCII bytes (the
/// common case), the run is located with a vectorized search instead of a
/// per-glyph decode loop.
fn parse_field(
    bytes: &[u8],
    format: &Format,
    b: &mut Builder,
    delim_lead: u8,
    quote: u8,
    quoting_enabled: bool,
    in_quote: bool,
) {
    // Trim leading whitespace (single-byte; multi-byte glyphs never match).
    while b.data_pos < bytes.len() && format.ws_flags.is_whitespace(bytes[b.data_pos]) {
        b.data_pos += 1;
    }

    if b.field_start == UNINITIALIZED {
        b.field_start = b.data_pos - b.current_row_start;
    }

    if !format.delimiter_is_multibyte() {
        match find_special(&bytes[b.data_pos..], delim_lead, quote, quoting_enabled, in_quote) {
            Some(next_special) => b.data_pos += next_special,
            None => b.data_pos = bytes.len(),
        }
    } else {
        while b.data_pos < bytes.len() {
            let (c, len, decode_error) = next_glyph(bytes, b.data_pos);
            if decode_error {
                b.row_has_utf8_error = true;
            }
            let is_multibyte_glyph = len > 1;
            let flag = compound_parse_flag(bytes, b.data_pos, c, is_multibyte_glyph, true, in_quote, format);
            if flag == ParseFlags::NotSpecial {
                b.data_pos += len;
            } else {
                break;
            }
        }
    }

    b.field_length = b.data_pos - (b.field_start + b.current_row_start);

    while b.field_length > 0 && format.ws_flags.is_whitespace(bytes[b.field_start + b.current_row_start + b.field_length - 1]) {
        b.field_length -= 1;
    }
}

/// Finds the nearest byte that ends a `NOT_SPECIAL` run, via vectorized
/// scans. Inside a quoted field (`in_quote`) the delimiter and newline
/// bytes are ordinary content, so only the quote byte is a stop point.
fn find_special(bytes: &[u8], delim: u8, quote: u8, quoting_enabled: bool, in_quote: bool) -> Option<usize> {
    if in_quote {
        return memchr::memchr(quote, bytes);
    }
    let a = if quoting_enabled {
        memchr::memchr3(delim, quote, b'\n', bytes)
    } else {
        memchr::memchr2(delim, b'\n', bytes)
    };
    let r = memchr::memchr(b'\r', bytes);
    match (a, r) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (Some(x), None) => Some(x),
        (None, Some(y)) => Some(y),
        (None, None) => None,
    }
}
