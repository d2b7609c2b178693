//! Table definitions and the table catalogue entry.

use super::column::Column;
use crate::dump::charset::Charset;
use crate::dump::constants::{DICTIONARY_MATCH_MIN, DICTIONARY_SIGNATURE};

/// The table currently being parsed. Replaced wholesale each time a new
/// `CREATE TABLE` (EXP) or metadata `<ROW>` (EXPDP) is recognized.
#[derive(Debug, Clone)]
pub struct Table {
    /// Schema name, in the dump's charset.
    pub schema: String,
    /// Table name, in the dump's charset.
    pub name: String,
    /// Columns in declaration order; unique by position, not by name.
    pub columns: Vec<Column>,
    /// Count of LOB-category columns (see `ColumnType::is_lob_category`).
    pub lob_col_count: usize,
    /// Charset the dump stores this table's text in.
    pub charset: Charset,
    /// Rows decoded so far for this table.
    pub record_count: u64,
    /// Byte offset of the table's defining DDL, for fast re-seek.
    pub ddl_offset: u64,
}

impl Table {
    pub fn new(schema: &str, name: &str, charset: Charset) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            columns: Vec::new(),
            lob_col_count: 0,
            charset,
            record_count: 0,
            ddl_offset: 0,
        }
    }

    pub fn empty(charset: Charset) -> Self {
        Self::new("", "", charset)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Recount LOB-category columns after the column list is final.
    pub fn update_lob_count(&mut self) {
        self.lob_col_count = self
            .columns
            .iter()
            .filter(|c| c.ctype.is_lob_category())
            .count();
    }

    /// Columns carried inline in the record stream (total minus LOB).
    pub fn non_lob_count(&self) -> usize {
        self.column_count().saturating_sub(self.lob_col_count)
    }

    /// Oracle's internal DataPump bookkeeping table matches a known column
    /// signature and must be skipped without notification.
    pub fn is_dictionary_table(&self) -> bool {
        let hits = self
            .columns
            .iter()
            .filter(|c| DICTIONARY_SIGNATURE.contains(&c.name.as_str()))
            .count();
        hits >= DICTIONARY_MATCH_MIN
    }
}

/// Compact summary of one table, appended to the session catalogue by the
/// listing operation. Independent of the live `Table`.
#[derive(Debug, Clone)]
pub struct TableEntry {
    pub schema: String,
    pub name: String,
    pub col_count: usize,
    pub row_count: u64,
}
