//! Public, zero-copy views over a parsed row and its fields.

use std::borrow::Cow;
use std::rc::Rc;

use crate::buffer::{ColNames, RawCSVData};
use crate::error::CsvError;

/// One parsed row: a lazily-accessed span of [`Field`]s sharing a single
/// backing buffer with every other row from the same chunk.
///
/// Cloning a `Row` clones an `Rc` handle, not the underlying bytes.
#[derive(Clone)]
pub struct Row {
    pub(crate) data: Rc<RawCSVData>,
    pub(crate) col_names: Option<Rc<ColNames>>,
    pub(crate) row_start: usize,
    pub(crate) fields_start: usize,
    pub(crate) field_count: usize,
}

impl Row {
    /// The number of fields in this row.
    pub fn len(&self) -> usize {
        self.field_count
    }

    /// Whether this row has no fields.
    pub fn is_empty(&self) -> bool {
        self.field_count == 0
    }

    /// Returns the field at `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<Field> {
        if index >= self.field_count {
            return None;
        }
        let entry = &self.data.fields[self.fields_start + index];
        Some(Field {
            data: Rc::clone(&self.data),
            start: self.row_start + entry.start as usize,
            length: entry.length as usize,
            has_escaped_quote: entry.has_escaped_quote,
        })
    }

    /// Returns the field at `index`, or [`CsvError::OutOfRange`] if out of
    /// range.
    pub fn field(&self, index: usize) -> Result<Field, CsvError> {
        self.get(index).ok_or(CsvError::OutOfRange { index, field_count: self.field_count })
    }

    /// Returns the field named `name` in the shared header, or an error if
    /// no header was configured, the name is unknown, or `name` falls
    /// outside this row's actual field count.
    pub fn get_by_name(&self, name: &str) -> Result<Field, CsvError> {
        let col_names = self.col_names.as_ref().ok_or_else(|| CsvError::UnknownColumn { name: name.to_string() })?;
        let index = col_names.index_of(name).ok_or_else(|| CsvError::UnknownColumn { name: name.to_string() })?;
        self.field(index)
    }

    /// The shared column-name table, if a header was configured.
    pub fn col_names(&self) -> Option<&ColNames> {
        self.col_names.as_deref()
    }

    /// Iterates over this row's fields in order.
    pub fn iter(&self) -> RowIter<'_> {
        RowIter { row: self, next: 0 }
    }
}

/// Iterator over a [`Row`]'s fields, yielded by [`Row::iter`].
pub struct RowIter<'a> {
    row: &'a Row,
    next: usize,
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Field;

    fn next(&mut self) -> Option<Field> {
        let field = self.row.get(self.next)?;
        self.next += 1;
        Some(field)
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = Field;
    type IntoIter = RowIter<'a>;

    fn into_iter(self) -> RowIter<'a> {
        self.iter()
    }
}

/// A zero-copy view of one field's bytes within the row's shared backing
/// buffer, plus a note of whether it contained an escaped quote pair (`""`)
/// that a string accessor must unescape.
#[derive(Clone)]
pub struct Field {
    data: Rc<RawCSVData>,
    start: usize,
    length: usize,
    has_escaped_quote: bool,
}

impl Field {
    /// The field's raw bytes, exactly as they appear between delimiters
    /// (quotes stripped, escaped quote pairs *not* unescaped).
    pub fn raw_bytes(&self) -> &[u8] {
        &self.data.bytes[self.start..self.start + self.length]
    }

    /// The field's content decoded as UTF-8 (lossily, substituting U+FFFD
    /// for invalid sequences) with any escaped quote pairs (`""`) collapsed
    /// to a single quote. Never fails; prefer [`Field::as_str`] when invalid
    /// UTF-8 should be reported rather than papered over.
    pub fn as_str_lossy(&self) -> Cow<'_, str> {
        dequote(String::from_utf8_lossy(self.raw_bytes()), self.has_escaped_quote, self.quote_char())
    }

    /// The field's content as a string, with any escaped quote pairs (`""`)
    /// collapsed to a single quote. Borrows directly when the field needed
    /// no de-escaping (the common case); otherwise allocates. Fails with
    /// [`CsvError::TypeMismatch`] if the raw bytes are not valid UTF-8.
    pub fn as_str(&self) -> Result<Cow<'_, str>, CsvError> {
        let s = std::str::from_utf8(self.raw_bytes())
            .map_err(|_| CsvError::TypeMismatch { raw: self.as_str_lossy().into_owned() })?;
        Ok(dequote(Cow::Borrowed(s), self.has_escaped_quote, self.quote_char()))
    }

    fn quote_char(&self) -> char {
        self.data.format.quote() as char
    }

    /// Whether this field matches one of the configured null-value literals
    /// (the empty string, by default).
    pub fn is_null(&self) -> bool {
        self.data.format.is_null_value(self.raw_bytes())
    }

    /// Whether this field parses as an integer (optionally signed).
    pub fn is_int(&self) -> bool {
        !self.is_null() && self.as_str().map(|s| s.parse::<i64>().is_ok()).unwrap_or(false)
    }

    /// Whether this field parses as a floating-point number (and is not
    /// already an integer).
    pub fn is_float(&self) -> bool {
        !self.is_null() && !self.is_int() && self.as_str().map(|s| s.parse::<f64>().is_ok()).unwrap_or(false)
    }

    /// Whether this field is neither null, an integer, nor a float.
    pub fn is_str(&self) -> bool {
        !self.is_null() && !self.is_int() && !self.is_float()
    }

    /// Coerces this field to `T` via [`FromField`]. `T = &str` borrows
    /// directly from the field when possible (see [`FromField`]'s impl for
    /// `&str`); every other supported `T` is owned.
    pub fn get<'a, T: FromField<'a>>(&'a self) -> Result<T, CsvError> {
        T::from_field(self)
    }
}

/// Collapses every escaped quote pair (`""`) in `s` to a single quote
/// character, borrowing directly when `has_escaped_quote` is false.
fn dequote(s: Cow<'_, str>, has_escaped_quote: bool, quote: char) -> Cow<'_, str> {
    if !has_escaped_quote {
        return s;
    }
    let doubled: String = [quote, quote].iter().collect();
    Cow::Owned(s.replace(&doubled, &quote.to_string()))
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for i64 {}
    impl Sealed for u64 {}
    impl Sealed for f64 {}
    impl Sealed for bool {}
    impl Sealed for String {}
    impl<'a> Sealed for &'a str {}
}

/// Types [`Field::get`] can coerce a field's bytes into. Sealed: implement
/// only the types this crate ships.
///
/// Carries a lifetime so `&'a str` can borrow straight out of the field
/// instead of every coercion being forced to allocate.
pub trait FromField<'a>: sealed::Sealed + Sized {
    /// Attempts to parse `field` as `Self`.
    fn from_field(field: &'a Field) -> Result<Self, CsvError>;
}

macro_rules! impl_from_field_numeric {
    ($ty:ty) => {
        impl<'a> FromField<'a> for $ty {
            fn from_field(field: &'a Field) -> Result<Self, CsvError> {
                let s = field.as_str()?;
                s.trim().parse::<$ty>().map_err(|_| CsvError::TypeMismatch { raw: s.to_string() })
            }
        }
    };
}

impl_from_field_numeric!(i64);
impl_from_field_numeric!(u64);
impl_from_field_numeric!(f64);

impl<'a> FromField<'a> for bool {
    fn from_field(field: &'a Field) -> Result<Self, CsvError> {
        match field.as_str()?.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "t" | "yes" => Ok(true),
            "false" | "0" | "f" | "no" => Ok(false),
            other => Err(CsvError::TypeMismatch { raw: other.to_string() }),
        }
    }
}

impl<'a> FromField<'a> for String {
    fn from_field(field: &'a Field) -> Result<Self, CsvError> {
        Ok(field.as_str()?.into_owned())
    }
}

impl<'a> FromField<'a> for &'a str {
    /// Borrows the field's bytes directly when no de-escaping is needed.
    /// A field with an escaped quote pair (`""`) can't be de-escaped without
    /// allocating, so that case is reported as [`CsvError::TypeMismatch`]
    /// rather than silently falling back to an owned string - callers who
    /// want de-escaping regardless of allocation should use `get::<String>()`.
    fn from_field(field: &'a Field) -> Result<Self, CsvError> {
        if field.has_escaped_quote {
            return Err(CsvError::TypeMismatch { raw: field.as_str_lossy().into_owned() });
        }
        std::str::from_utf8(field.raw_bytes())
            .map_err(|_| CsvError::TypeMismatch { raw: field.as_str_lossy().into_owned() })
    }
}
