//! The per-chunk backing buffer and the column-name table shared by every
//! row the reader produces.

use std::collections::HashMap;
use std::rc::Rc;

use crate::format::Format;

/// One field's location within a [`RawCSVData`]'s bytes.
#[derive(Copy, Clone, Debug)]
pub(crate) struct FieldEntry {
    pub start: u32,
    pub length: u32,
    pub has_escaped_quote: bool,
}

/// One chunk's bytes plus the field index parsed from them.
///
/// Created per chunk by the parser as a plain, exclusively-owned builder;
/// finalized into this immutable, reference-counted form only once the
/// chunk's parse pass has fully completed (see the crate-level docs on
/// ownership). Every [`crate::Row`]/[`crate::Field`] produced from the chunk
/// clones an `Rc` handle to it, so the buffer is dropped only once the last
/// such handle is.
pub(crate) struct RawCSVData {
    pub bytes: Box<[u8]>,
    pub fields: Vec<FieldEntry>,
    pub format: Rc<Format>,
}

impl RawCSVData {
    #[inline]
    pub fn field_bytes(&self, entry: &FieldEntry) -> &[u8] {
        let start = entry.start as usize;
        let end = start + entry.length as usize;
        &self.bytes[start..end]
    }
}

/// The ordered header names and the name→index map built from the header
/// row, shared by every row the reader subsequently yields.
pub struct ColNames {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColNames {
    pub(crate) fn new(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        ColNames { names, index }
    }

    pub(crate) fn empty() -> Self {
        ColNames {
            names: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// The header names, in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Looks up a column's index by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// The number of columns in the header.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no header was configured (or the header had no columns).
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
