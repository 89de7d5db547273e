//! Sources of chunked input bytes.
//!
//! The parser itself never reads a file or socket; it only ever sees byte
//! slices handed to it by a [`ChunkSource`]. This is the seam that lets
//! [`crate::Reader`] run identically over an in-memory buffer, a plain
//! `std::io::Read`, or (outside this crate) a memory-mapped file.

use std::io::{self, Read};

/// One delivery of input bytes from a [`ChunkSource`].
pub struct Chunk {
    /// The bytes delivered this call. May be empty (e.g. a rewound tail with
    /// no new bytes available yet).
    pub bytes: Vec<u8>,
    /// Whether the source is now exhausted: no future `next_chunk` call will
    /// ever produce bytes beyond what's already included here.
    ///
    /// A source MUST set this the moment it knows no more bytes are
    /// coming, even when `bytes` is non-empty - e.g. the final read off a
    /// file, which returns its last few bytes and `eof: true` in the same
    /// call. The parser relies on this signal (not on inspecting the bytes
    /// themselves) to flush a trailing, chunk-boundary-truncated row instead
    /// of holding it back to wait for a chunk that will never arrive.
    pub eof: bool,
}

/// Supplies chunks of input bytes to a [`crate::Reader`].
///
/// `next_chunk` is called once per refill. `rewind` hands back the tail of
/// the previously returned chunk that the parser could not finish a row
/// with - the next `next_chunk` call must yield those bytes again,
/// immediately followed by any new bytes.
pub trait ChunkSource {
    /// Returns the next chunk of input. See [`Chunk::eof`] for the exact
    /// end-of-input contract: a source reports it explicitly rather than
    /// leaving the caller to infer it from an empty or repeated read.
    fn next_chunk(&mut self) -> Result<Chunk, io::Error>;

    /// Returns `unconsumed` (the undigested tail of the last chunk) to the
    /// front of the stream, to be re-delivered by the next `next_chunk`
    /// call ahead of any new bytes.
    fn rewind(&mut self, unconsumed: &[u8]);
}

/// A [`ChunkSource`] over an already-resident byte slice, handed out in
/// fixed-size pieces. Useful for parsing an in-memory buffer (e.g. the
/// contents of a memory-mapped file) without copying it up front.
pub struct SliceChunkSource<'a> {
    remaining: &'a [u8],
    pending: Option<Vec<u8>>,
    chunk_size: usize,
}

impl<'a> SliceChunkSource<'a> {
    /// Creates a source that yields `data` in pieces of `chunk_size` bytes.
    pub fn new(data: &'a [u8], chunk_size: usize) -> Self {
        SliceChunkSource { remaining: data, pending: None, chunk_size: chunk_size.max(1) }
    }
}

impl<'a> ChunkSource for SliceChunkSource<'a> {
    fn next_chunk(&mut self) -> Result<Chunk, io::Error> {
        // A previously rewound tail is returned in full, plus up to another
        // `chunk_size` bytes of new data - never capped to `chunk_size`
        // total, or a tail already at or past that length would starve the
        // caller of forward progress and read as a false end-of-input.
        let mut bytes = self.pending.take().unwrap_or_default();
        let take = self.chunk_size.min(self.remaining.len());
        bytes.extend_from_slice(&self.remaining[..take]);
        self.remaining = &self.remaining[take..];
        let eof = self.remaining.is_empty();
        Ok(Chunk { bytes, eof })
    }

    fn rewind(&mut self, unconsumed: &[u8]) {
        self.pending = Some(unconsumed.to_vec());
    }
}

/// A [`ChunkSource`] reading from any [`std::io::Read`], buffered through
/// fixed-size reads.
pub struct ReadChunkSource<R> {
    reader: R,
    buf: Vec<u8>,
    chunk_size: usize,
    pending: Vec<u8>,
}

impl<R: Read> ReadChunkSource<R> {
    /// Creates a source reading from `reader` in pieces of `chunk_size` bytes.
    pub fn new(reader: R, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        ReadChunkSource { reader, buf: vec![0u8; chunk_size], chunk_size, pending: Vec::new() }
    }
}

impl<R: Read> ChunkSource for ReadChunkSource<R> {
    fn next_chunk(&mut self) -> Result<Chunk, io::Error> {
        // As with `SliceChunkSource`, a rewound tail is never allowed to
        // shrink the new read below `chunk_size` bytes. `read_up_to` only
        // returns short when the underlying reader hit true EOF, so a short
        // read is exactly the signal `eof` needs.
        let mut bytes = std::mem::take(&mut self.pending);
        let n = read_up_to(&mut self.reader, &mut self.buf)?;
        bytes.extend_from_slice(&self.buf[..n]);
        let eof = n < self.buf.len();
        Ok(Chunk { bytes, eof })
    }

    fn rewind(&mut self, unconsumed: &[u8]) {
        self.pending = unconsumed.to_vec();
    }
}

/// Reads until `buf` is full or the underlying reader reaches EOF, so a
/// `Read` implementation that returns short reads (as many do) doesn't
/// starve the parser of a full chunk's worth of bytes prematurely.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, io::Error> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
