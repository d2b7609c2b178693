//! Export sinks: render the row stream to CSV or SQL `INSERT` statements.
//!
//! Both exporters subscribe to the row callback contract; neither touches
//! binary dump structure. Write errors are latched and surfaced by
//! `finish`, since sink callbacks cannot fail mid-parse.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::dump::types::ColumnType;
use crate::error::Result;
use crate::session::{DumpSink, RowEvent, Session};

/// Target dialect for SQL export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    Oracle,
    Postgres,
    MySql,
    SqlServer,
}

/// Streams rows to RFC 4180 CSV: fields containing a comma, quote, CR or
/// LF are quoted, embedded quotes doubled, records end with CRLF.
///
/// A header line of column names is written whenever the row stream moves
/// to a new table.
pub struct CsvExporter<W: Write> {
    out: W,
    headers: bool,
    current_table: String,
    rows: u64,
    error: Option<io::Error>,
}

impl<W: Write> CsvExporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            headers: true,
            current_table: String::new(),
            rows: 0,
            error: None,
        }
    }

    /// Suppress the per-table header line.
    pub fn without_headers(mut self) -> Self {
        self.headers = false;
        self
    }

    /// Rows written so far.
    pub fn row_count(&self) -> u64 {
        self.rows
    }

    /// Flush and surface any write error latched during the parse.
    pub fn finish(mut self) -> Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_record<'a>(&mut self, fields: impl Iterator<Item = &'a [u8]>) {
        if self.error.is_some() {
            return;
        }
        let mut line: Vec<u8> = Vec::new();
        for (i, field) in fields.enumerate() {
            if i > 0 {
                line.push(b',');
            }
            push_csv_field(&mut line, field);
        }
        line.extend_from_slice(b"\r\n");
        if let Err(e) = self.out.write_all(&line) {
            self.error = Some(e);
        }
    }
}

impl<W: Write> DumpSink for CsvExporter<W> {
    fn on_row(&mut self, event: &RowEvent<'_>) {
        if self.headers && self.current_table != event.table {
            self.current_table = event.table.to_string();
            self.write_record(event.col_names.iter().map(|n| n.as_bytes()));
        }
        self.write_record(event.values.iter().map(|v| v.as_bytes()));
        self.rows += 1;
    }
}

fn push_csv_field(out: &mut Vec<u8>, field: &[u8]) {
    let needs_quoting = field
        .iter()
        .any(|&b| matches!(b, b',' | b'"' | b'\r' | b'\n'));
    if !needs_quoting {
        out.extend_from_slice(field);
        return;
    }
    out.push(b'"');
    for &b in field {
        if b == b'"' {
            out.push(b'"');
        }
        out.push(b);
    }
    out.push(b'"');
}

/// Streams rows as `INSERT INTO` statements with dialect-appropriate
/// identifier quoting. Numeric values stay bare; everything else becomes
/// a string literal with embedded quotes doubled.
pub struct SqlExporter<W: Write> {
    out: W,
    dialect: SqlDialect,
    rows: u64,
    error: Option<io::Error>,
}

impl<W: Write> SqlExporter<W> {
    pub fn new(out: W, dialect: SqlDialect) -> Self {
        Self {
            out,
            dialect,
            rows: 0,
            error: None,
        }
    }

    pub fn row_count(&self) -> u64 {
        self.rows
    }

    pub fn finish(mut self) -> Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> DumpSink for SqlExporter<W> {
    fn on_row(&mut self, event: &RowEvent<'_>) {
        if self.error.is_some() {
            return;
        }
        let mut stmt: Vec<u8> = Vec::new();
        stmt.extend_from_slice(b"INSERT INTO ");
        if !event.schema.is_empty() {
            stmt.extend_from_slice(quote_ident(self.dialect, event.schema).as_bytes());
            stmt.push(b'.');
        }
        stmt.extend_from_slice(quote_ident(self.dialect, event.table).as_bytes());

        stmt.extend_from_slice(b" (");
        for (i, name) in event.col_names.iter().enumerate() {
            if i > 0 {
                stmt.extend_from_slice(b", ");
            }
            stmt.extend_from_slice(quote_ident(self.dialect, name).as_bytes());
        }
        stmt.extend_from_slice(b") VALUES (");
        for (i, value) in event.values.iter().enumerate() {
            if i > 0 {
                stmt.extend_from_slice(b", ");
            }
            if value.is_null() {
                stmt.extend_from_slice(b"NULL");
            } else if is_bare_numeric(value.ctype()) && !value.is_empty() {
                stmt.extend_from_slice(value.as_bytes());
            } else {
                stmt.push(b'\'');
                for &b in value.as_bytes() {
                    if b == b'\'' {
                        stmt.push(b'\'');
                    }
                    stmt.push(b);
                }
                stmt.push(b'\'');
            }
        }
        stmt.extend_from_slice(b");\n");

        if let Err(e) = self.out.write_all(&stmt) {
            self.error = Some(e);
        }
        self.rows += 1;
    }
}

fn is_bare_numeric(ctype: ColumnType) -> bool {
    matches!(
        ctype,
        ColumnType::Number | ColumnType::Float | ColumnType::BinaryFloat | ColumnType::BinaryDouble
    )
}

fn quote_ident(dialect: SqlDialect, name: &str) -> String {
    match dialect {
        SqlDialect::Oracle | SqlDialect::Postgres => format!("\"{}\"", name),
        SqlDialect::MySql => format!("`{}`", name),
        SqlDialect::SqlServer => format!("[{}]", name),
    }
}

impl Session {
    /// Parse the dump and write rows to a CSV file. A table name
    /// restricts the export to that table.
    pub fn export_csv(&mut self, table: Option<&str>, path: &Path) -> Result<u64> {
        if let Some(t) = table {
            self.set_table_filter(None, t)?;
        }
        let file = File::create(path)?;
        let mut exporter = CsvExporter::new(BufWriter::new(file));
        self.parse(&mut exporter)?;
        let rows = exporter.row_count();
        exporter.finish()?;
        info!("exported {} rows to {}", rows, path.display());
        Ok(rows)
    }

    /// Parse the dump and write rows as SQL `INSERT` statements.
    pub fn export_sql(
        &mut self,
        table: Option<&str>,
        path: &Path,
        dialect: SqlDialect,
    ) -> Result<u64> {
        if let Some(t) = table {
            self.set_table_filter(None, t)?;
        }
        let file = File::create(path)?;
        let mut exporter = SqlExporter::new(BufWriter::new(file), dialect);
        self.parse(&mut exporter)?;
        let rows = exporter.row_count();
        exporter.finish()?;
        info!("exported {} rows to {}", rows, path.display());
        Ok(rows)
    }
}
