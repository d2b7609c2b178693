//! Reusable decoded column values.

use bytes::BytesMut;
use std::borrow::Cow;

use super::column::ColumnType;

/// Buffer growth happens in coarse steps so repeated rows settle into a
/// stable allocation.
const BUF_STEP: usize = 256;

/// One decoded column value in the current row.
///
/// The backing buffer survives `set_null` and row resets; only the length
/// and flags change. Once a value is null its buffer content is
/// unspecified and must not be read.
#[derive(Debug)]
pub struct Value {
    is_null: bool,
    buf: BytesMut,
    ctype: ColumnType,
}

/// A value starts out null until a decoder fills it.
impl Default for Value {
    fn default() -> Self {
        Self {
            is_null: true,
            buf: BytesMut::new(),
            ctype: ColumnType::Null,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        self.is_null
    }

    pub fn ctype(&self) -> ColumnType {
        self.ctype
    }

    /// Mark null, keeping the buffer for reuse.
    pub fn set_null(&mut self) {
        self.is_null = true;
        self.buf.clear();
        self.ctype = ColumnType::Null;
    }

    /// Store decoded bytes (already in the output charset).
    pub fn set_bytes(&mut self, data: &[u8], ctype: ColumnType) {
        self.reserve(data.len());
        self.buf.clear();
        self.buf.extend_from_slice(data);
        self.is_null = false;
        self.ctype = ctype;
    }

    /// Store decoded text.
    pub fn set_text(&mut self, text: &str, ctype: ColumnType) {
        self.set_bytes(text.as_bytes(), ctype);
    }

    /// Trim trailing pad spaces in place (fixed-width CHAR/NCHAR).
    pub fn trim_trailing_spaces(&mut self) {
        if self.is_null {
            return;
        }
        let keep = self
            .buf
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |i| i + 1);
        self.buf.truncate(keep);
    }

    /// Raw decoded bytes; empty for null values.
    pub fn as_bytes(&self) -> &[u8] {
        if self.is_null {
            &[]
        } else {
            &self.buf
        }
    }

    /// Decoded value as text. Lossy only when the output charset is not
    /// UTF-8; absent (null) values surface as an empty string.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    fn reserve(&mut self, needed: usize) {
        if self.buf.capacity() < needed {
            let target = needed.div_ceil(BUF_STEP) * BUF_STEP;
            self.buf.reserve(target - self.buf.len());
        }
    }
}
