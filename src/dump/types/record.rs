//! Row buffer, per-table metadata cache, and the per-column decode
//! dispatch shared by both format parsers.

use crate::dump::charset::{self, Charset};
use crate::dump::decode::{
    decode_binary_double, decode_binary_float, decode_date, decode_number, decode_timestamp,
    DateFormat,
};
use crate::dump::types::column::{Column, ColumnType};
use crate::dump::types::table::Table;
use crate::error::Result;

/// One row of decoded values, reused across rows: values keep their
/// backing storage between rows to avoid per-row allocation.
#[derive(Debug, Default)]
pub struct Record {
    values: Vec<super::value::Value>,
    col_count: usize,
}

impl Record {
    /// Grow the value pool to hold at least `n` columns.
    pub fn ensure_columns(&mut self, n: usize) {
        if self.values.len() < n {
            self.values.resize_with(n, Default::default);
        }
    }

    /// Reset for the next row: used values become null, buffers kept.
    pub fn reset(&mut self) {
        for v in &mut self.values[..self.col_count] {
            v.set_null();
        }
        self.col_count = 0;
    }

    /// Access the value slot for a column, growing as needed, and track
    /// the highest column written so far.
    pub fn value_mut(&mut self, idx: usize) -> &mut super::value::Value {
        self.ensure_columns(idx + 1);
        if idx + 1 > self.col_count {
            self.col_count = idx + 1;
        }
        &mut self.values[idx]
    }

    pub fn col_count(&self) -> usize {
        self.col_count
    }

    pub fn set_col_count(&mut self, n: usize) {
        self.ensure_columns(n);
        self.col_count = n;
    }

    /// The values of the current row, one per column.
    pub fn values(&self) -> &[super::value::Value] {
        &self.values[..self.col_count]
    }
}

/// Per-table metadata snapshot handed to row and progress events.
///
/// Identifiers are decoded from the dump's charset when their DDL is
/// parsed, so this cache assembles the event-facing name arrays once per
/// table instead of once per row. It is keyed on the table's identity
/// (schema + name + column count) and must be invalidated whenever a new
/// table definition begins parsing, even before its name is known.
#[derive(Debug, Default)]
pub struct MetaCache {
    valid: bool,
    src_col_count: usize,
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub name: String,
    /// Column names, in declaration order.
    pub col_names: Vec<String>,
    /// Rendered type strings, parallel to `col_names`.
    pub col_types: Vec<String>,
}

impl MetaCache {
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Rebuild if the active table's identity changed.
    pub fn update(&mut self, table: &Table) {
        if self.valid
            && self.src_col_count == table.column_count()
            && self.schema == table.schema
            && self.name == table.name
        {
            return;
        }

        self.schema = table.schema.clone();
        self.name = table.name.clone();

        self.col_names.clear();
        self.col_types.clear();
        for col in &table.columns {
            self.col_names.push(col.name.clone());
            self.col_types.push(col.type_str.clone());
        }

        self.src_col_count = table.column_count();
        self.valid = true;
    }
}

/// Placeholders for LOB values whose content is not materialized.
pub const BLOB_PLACEHOLDER: &str = "%BLOB%";
pub const CLOB_PLACEHOLDER: &str = "%CLOB%";
pub const NCLOB_PLACEHOLDER: &str = "%NCLOB%";
pub const BFILE_PLACEHOLDER: &str = "%BFILE%";

/// Decode one column's raw dump bytes into its value slot, dispatching on
/// the column's semantic type. A decoder failure nulls the value instead
/// of aborting the row.
pub fn decode_column(
    col: &Column,
    data: &[u8],
    dump_charset: Charset,
    out_charset: Charset,
    date_format: DateFormat,
    value: &mut super::value::Value,
) {
    match col.ctype {
        ColumnType::Number | ColumnType::Float => {
            set_decoded(value, decode_number(data), col.ctype);
        }
        ColumnType::Date => {
            set_decoded(value, decode_date(data, date_format), col.ctype);
        }
        ColumnType::Timestamp | ColumnType::TimestampTz | ColumnType::TimestampLtz => {
            set_decoded(value, decode_timestamp(data, date_format), col.ctype);
        }
        ColumnType::BinaryFloat => {
            set_decoded(value, decode_binary_float(data), col.ctype);
        }
        ColumnType::BinaryDouble => {
            set_decoded(value, decode_binary_double(data), col.ctype);
        }
        ColumnType::Raw | ColumnType::Rowid => {
            let mut hex = String::with_capacity(data.len() * 2 + 2);
            hex.push_str("0x");
            for b in data {
                hex.push(HEX[(b >> 4) as usize] as char);
                hex.push(HEX[(b & 0x0F) as usize] as char);
            }
            value.set_text(&hex, col.ctype);
        }
        ColumnType::Blob | ColumnType::LongRaw => {
            value.set_text(BLOB_PLACEHOLDER, col.ctype);
        }
        ColumnType::NClob => {
            value.set_text(NCLOB_PLACEHOLDER, col.ctype);
        }
        ColumnType::Bfile => {
            value.set_text(BFILE_PLACEHOLDER, col.ctype);
        }
        ColumnType::Clob | ColumnType::Long => {
            set_converted(value, data, dump_charset, out_charset, col.ctype);
        }
        _ => {
            // Character types: CHAR, NCHAR, VARCHAR, NVARCHAR and the
            // VARCHAR fallback for unknown types.
            set_converted(value, data, dump_charset, out_charset, col.ctype);
            if col.ctype.is_fixed_char() {
                value.trim_trailing_spaces();
            }
        }
    }
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn set_decoded(value: &mut super::value::Value, decoded: Result<String>, ctype: ColumnType) {
    match decoded {
        Ok(text) => value.set_text(&text, ctype),
        Err(_) => value.set_null(),
    }
}

fn set_converted(
    value: &mut super::value::Value,
    data: &[u8],
    dump_charset: Charset,
    out_charset: Charset,
    ctype: ColumnType,
) {
    match charset::convert(data, dump_charset, out_charset) {
        Ok(converted) => value.set_bytes(&converted, ctype),
        Err(_) => value.set_bytes(data, ctype),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(col: &Column, data: &[u8]) -> super::super::value::Value {
        let mut v = Default::default();
        decode_column(
            col,
            data,
            Charset::Utf8,
            Charset::Utf8,
            DateFormat::Slash,
            &mut v,
        );
        v
    }

    #[test]
    fn test_record_reuse_resets_values() {
        let mut rec = Record::default();
        rec.value_mut(0).set_text("a", ColumnType::Varchar);
        rec.value_mut(1).set_text("b", ColumnType::Varchar);
        assert_eq!(rec.col_count(), 2);

        rec.reset();
        assert_eq!(rec.col_count(), 0);
        rec.value_mut(0).set_text("c", ColumnType::Varchar);
        assert_eq!(rec.values().len(), 1);
        assert_eq!(rec.values()[0].as_str(), "c");
    }

    #[test]
    fn test_meta_cache_rebuilds_on_table_change() {
        let mut cache = MetaCache::default();
        let mut t = Table::new("SCOTT", "EMP", Charset::Utf8);
        t.columns.push(Column::from_ddl("ID", "NUMBER"));
        cache.update(&t);
        assert_eq!(cache.name, "EMP");
        assert_eq!(cache.col_names, vec!["ID"]);

        let mut t2 = Table::new("SCOTT", "DEPT", Charset::Utf8);
        t2.columns.push(Column::from_ddl("DEPTNO", "NUMBER"));
        t2.columns.push(Column::from_ddl("DNAME", "VARCHAR2(14)"));
        cache.update(&t2);
        assert_eq!(cache.name, "DEPT");
        assert_eq!(cache.col_names, vec!["DEPTNO", "DNAME"]);
        assert_eq!(cache.col_types, vec!["NUMBER", "VARCHAR2(14)"]);
    }

    #[test]
    fn test_decode_number_column() {
        let col = Column::from_ddl("N", "NUMBER");
        let v = decode_one(&col, &[0xC1, 0x02]);
        assert_eq!(v.as_str(), "1");
    }

    #[test]
    fn test_decode_raw_column_hex() {
        let col = Column::from_ddl("R", "RAW(16)");
        let v = decode_one(&col, &[0xDE, 0xAD, 0x01]);
        assert_eq!(v.as_str(), "0xDEAD01");
    }

    #[test]
    fn test_decode_char_trims_padding() {
        let col = Column::from_ddl("C", "CHAR(8)");
        let v = decode_one(&col, b"ab      ");
        assert_eq!(v.as_str(), "ab");
    }

    #[test]
    fn test_decode_varchar_keeps_spaces() {
        let col = Column::from_ddl("C", "VARCHAR2(8)");
        let v = decode_one(&col, b"ab  ");
        assert_eq!(v.as_str(), "ab  ");
    }

    #[test]
    fn test_decode_lob_placeholders() {
        assert_eq!(
            decode_one(&Column::from_ddl("B", "BLOB"), b"x").as_str(),
            "%BLOB%"
        );
        assert_eq!(
            decode_one(&Column::from_ddl("B", "NCLOB"), b"x").as_str(),
            "%NCLOB%"
        );
        assert_eq!(
            decode_one(&Column::from_ddl("B", "BFILE"), b"x").as_str(),
            "%BFILE%"
        );
        assert_eq!(
            decode_one(&Column::from_ddl("B", "LONG RAW"), b"x").as_str(),
            "%BLOB%"
        );
    }

    #[test]
    fn test_decoder_failure_yields_null() {
        let col = Column::from_ddl("D", "DATE");
        let v = decode_one(&col, &[0x01, 0x02]); // too short
        assert!(v.is_null());
    }
}
