//! The public, pull-based entry point: [`Reader`] turns a [`ChunkSource`]
//! into an iterator of [`Row`]s.

use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::buffer::{ColNames, RawCSVData};
use crate::chunk::{ChunkSource, ReadChunkSource, SliceChunkSource};
use crate::error::CsvError;
use crate::format::{Format, HeaderRow, VariableColumnPolicy};
use crate::parser::{self, ParsedRow};
use crate::row::Row;

/// Reads rows out of a [`ChunkSource`], resolving the header (if any) up
/// front and yielding every subsequent row lazily, one [`ChunkSource::next_chunk`]
/// call at a time.
pub struct Reader<S> {
    source: S,
    format: Rc<Format>,
    col_names: Option<Rc<ColNames>>,
    queue: VecDeque<Result<Row, CsvError>>,
    bom_checked: bool,
    exhausted: bool,
    rows_seen: usize,
    utf8_error_rows: usize,
}

impl<'a> Reader<SliceChunkSource<'a>> {
    /// Builds a reader over an in-memory buffer, read in pieces of
    /// `chunk_size` bytes.
    pub fn from_slice(data: &'a [u8], format: Format, chunk_size: usize) -> Result<Self, CsvError> {
        Reader::new(SliceChunkSource::new(data, chunk_size), format)
    }
}

impl<R: io::Read> Reader<ReadChunkSource<R>> {
    /// Builds a reader over any [`std::io::Read`], read in pieces of
    /// `chunk_size` bytes.
    pub fn from_reader(reader: R, format: Format, chunk_size: usize) -> Result<Self, CsvError> {
        Reader::new(ReadChunkSource::new(reader, chunk_size), format)
    }
}

impl<S: ChunkSource> Reader<S> {
    /// Builds a reader over `source`, eagerly resolving the header row (if
    /// [`Format::header_row`] names one) before returning.
    pub fn new(source: S, format: Format) -> Result<Self, CsvError> {
        let mut reader = Reader {
            source,
            format: Rc::new(format),
            col_names: None,
            queue: VecDeque::new(),
            bom_checked: false,
            exhausted: false,
            rows_seen: 0,
            utf8_error_rows: 0,
        };
        reader.resolve_header()?;
        Ok(reader)
    }

    /// The resolved column names, if a header was configured.
    pub fn col_names(&self) -> Option<&ColNames> {
        self.col_names.as_deref()
    }

    /// Whether any row seen so far contained a malformed UTF-8 sequence
    /// (recovered from via `U+FFFD` substitution rather than surfaced as an
    /// error).
    pub fn had_utf8_errors(&self) -> bool {
        self.utf8_error_rows > 0
    }

    /// The number of rows so far that contained at least one malformed
    /// UTF-8 sequence.
    pub fn utf8_error_count(&self) -> usize {
        self.utf8_error_rows
    }

    /// The total number of rows parsed so far, including the header row (if
    /// any) and rows dropped by [`VariableColumnPolicy::Ignore`] - every row
    /// the state machine has completed, whether or not it reached the
    /// caller.
    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    fn resolve_header(&mut self) -> Result<(), CsvError> {
        let header_index = match self.format.header_row() {
            HeaderRow::None => return Ok(()),
            HeaderRow::Index(i) => i,
        };

        let mut discarded = 0usize;
        loop {
            if let Some(result) = self.queue.pop_front() {
                let row = result?;
                if discarded < header_index {
                    discarded += 1;
                    continue;
                }
                let names: Vec<String> = row.iter().map(|f| f.as_str_lossy().into_owned()).collect();
                self.col_names = Some(Rc::new(ColNames::new(names)));
                return Ok(());
            }
            if self.exhausted {
                return Err(CsvError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended before the configured header row was reached",
                )));
            }
            self.pull_chunk()?;
        }
    }

    /// Pulls and parses one more chunk from the source, enqueuing any
    /// complete rows it yields. A no-op once the source is exhausted.
    fn pull_chunk(&mut self) -> Result<(), CsvError> {
        if self.exhausted {
            return Ok(());
        }

        let chunk = self.source.next_chunk()?;

        let outcome = parser::parse_chunk(&chunk.bytes, &self.format, !self.bom_checked, chunk.eof);
        self.bom_checked = true;

        let raw = Rc::new(RawCSVData {
            bytes: chunk.bytes[..outcome.tail_start].to_vec().into_boxed_slice(),
            fields: outcome.fields,
            format: Rc::clone(&self.format),
        });

        for parsed in &outcome.rows {
            self.rows_seen += 1;
            if parsed.had_utf8_error {
                self.utf8_error_rows += 1;
            }
            self.enqueue_row(&raw, parsed);
        }

        if chunk.eof {
            self.exhausted = true;
        } else if outcome.tail_start < chunk.bytes.len() {
            self.source.rewind(&chunk.bytes[outcome.tail_start..]);
        }

        Ok(())
    }

    fn enqueue_row(&mut self, raw: &Rc<RawCSVData>, parsed: &ParsedRow) {
        let row = Row {
            data: Rc::clone(raw),
            col_names: self.col_names.clone(),
            row_start: parsed.row_start,
            fields_start: parsed.fields_start,
            field_count: parsed.field_count,
        };

        let expected = self.col_names.as_ref().map(|c| c.len());
        if let Some(expected) = expected {
            if row.len() != expected {
                match self.format.variable_column_policy() {
                    VariableColumnPolicy::Strict => {
                        self.queue.push_back(Err(CsvError::MalformedRow { expected, actual: row.len() }));
                        return;
                    }
                    VariableColumnPolicy::Ignore => return,
                    VariableColumnPolicy::Keep => {}
                }
            }
        }
        self.queue.push_back(Ok(row));
    }
}

impl<S: ChunkSource> Iterator for Reader<S> {
    type Item = Result<Row, CsvError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.queue.pop_front() {
                return Some(row);
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.pull_chunk() {
                return Some(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FormatBuilder;

    #[test]
    fn basic_header_and_rows() {
        let data = b"a,b,c\n1,2,3\n4,5,6\n";
        let format = FormatBuilder::new().build().unwrap();
        let reader = Reader::from_slice(data, format, 1024).unwrap();
        let names: Vec<_> = reader.col_names().unwrap().names().to_vec();
        assert_eq!(names, vec!["a", "b", "c"]);
        let rows: Vec<Row> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_by_name("b").unwrap().raw_bytes(), b"2");
        assert_eq!(rows[1].get(2).unwrap().raw_bytes(), b"6");
    }

    #[test]
    fn chunking_does_not_change_the_result() {
        let data = b"a,b\n1,hello world\n2,another row here\n3,x\n";
        let format = FormatBuilder::new().build().unwrap();
        let whole = Reader::from_slice(data, format.clone(), 4096)
            .unwrap()
            .map(|r| r.unwrap().get(1).unwrap().raw_bytes().to_vec())
            .collect::<Vec<_>>();
        let chunked = Reader::from_slice(data, format, 3)
            .unwrap()
            .map(|r| r.unwrap().get(1).unwrap().raw_bytes().to_vec())
            .collect::<Vec<_>>();
        assert_eq!(whole, chunked);
    }

    #[test]
    fn no_header_yields_every_row() {
        let data = b"1,2\n3,4\n";
        let format = FormatBuilder::new().header_row(HeaderRow::None).build().unwrap();
        let reader = Reader::from_slice(data, format, 1024).unwrap();
        assert!(reader.col_names().is_none());
        let rows: Vec<Row> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn header_past_end_of_stream_is_an_error() {
        let data = b"only,one,row\n";
        let format = FormatBuilder::new().header_row(HeaderRow::Index(3)).build().unwrap();
        assert!(Reader::from_slice(data, format, 1024).is_err());
    }

    #[test]
    fn strict_policy_flags_malformed_rows() {
        let data = b"a,b\n1,2\n3\n";
        let format = FormatBuilder::new().variable_column_policy(VariableColumnPolicy::Strict).build().unwrap();
        let reader = Reader::from_slice(data, format, 1024).unwrap();
        let results: Vec<_> = reader.collect();
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(CsvError::MalformedRow { expected: 2, actual: 1 })));
    }

    #[test]
    fn ignore_policy_drops_malformed_rows() {
        let data = b"a,b\n1,2\n3\n4,5\n";
        let format = FormatBuilder::new().variable_column_policy(VariableColumnPolicy::Ignore).build().unwrap();
        let reader = Reader::from_slice(data, format, 1024).unwrap();
        let rows: Vec<Row> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn quoted_field_may_embed_delimiter_and_newline() {
        let data = b"a,b\n\"hello, world\",\"multi\nline\"\n";
        let format = FormatBuilder::new().build().unwrap();
        let reader = Reader::from_slice(data, format, 1024).unwrap();
        let rows: Vec<Row> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0).unwrap().raw_bytes(), b"hello, world");
        assert_eq!(rows[0].get(1).unwrap().raw_bytes(), b"multi\nline");
    }

    #[test]
    fn trailing_delimiter_implies_empty_final_field() {
        let data = b"a,b,c\n1,2,\n";
        let format = FormatBuilder::new().build().unwrap();
        let reader = Reader::from_slice(data, format, 1024).unwrap();
        let rows: Vec<Row> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0].get(2).unwrap().raw_bytes(), b"");
    }

    #[test]
    fn leading_bom_is_stripped() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"a,b\n1,2\n");
        let format = FormatBuilder::new().build().unwrap();
        let reader = Reader::from_slice(&data, format, 1024).unwrap();
        let names = reader.col_names().unwrap().names().to_vec();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn multibyte_delimiter_is_respected() {
        let data = "a§b\n1§2\n".as_bytes();
        let format = FormatBuilder::new().delimiter('§').build().unwrap();
        let reader = Reader::from_slice(data, format, 1024).unwrap();
        let rows: Vec<Row> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].get(1).unwrap().raw_bytes(), b"2");
    }
}
