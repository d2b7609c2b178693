//! Dump-parsing session: configuration, per-operation state and the
//! operation entry points.
//!
//! A session parses one dump file at a time. Operations borrow the session
//! mutably for their whole duration, so a second in-flight operation on
//! the same session is rejected at compile time; separate sessions are
//! fully independent. Event structs borrow session-owned buffers and are
//! only valid inside the callback invocation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;

use crate::dump::charset::Charset;
use crate::dump::decode::DateFormat;
use crate::dump::detect::{self, DumpKind};
use crate::dump::exp;
use crate::dump::expdp;
use crate::dump::types::{MetaCache, Record, Table, TableEntry, Value};
use crate::error::{Error, Result};

/// A recognized table definition.
#[derive(Debug)]
pub struct TableEvent<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    /// Column names, in declaration order.
    pub col_names: &'a [String],
    /// Rendered type strings, parallel to `col_names`.
    pub col_types: &'a [String],
    /// Rows decoded for this table. Zero during listing; known only after
    /// a full parse.
    pub row_count: u64,
    /// Byte offset of the table's DDL. Feed back via
    /// [`Session::set_seek_offset`] to jump straight to this table on a
    /// later filtered parse.
    pub ddl_offset: u64,
}

/// One fully-decoded row.
#[derive(Debug)]
pub struct RowEvent<'a> {
    pub schema: &'a str,
    pub table: &'a str,
    /// Column names, parallel to `values`.
    pub col_names: &'a [String],
    /// Decoded values; null columns surface as empty strings.
    pub values: &'a [Value],
}

/// Receiver for parse events. All methods default to no-ops.
///
/// Callbacks run on the parsing thread. The borrowed event data points
/// into session-owned buffers that are reused for the next row or table;
/// the lifetimes prevent retaining it past the call.
pub trait DumpSink {
    fn on_table(&mut self, _event: &TableEvent<'_>) {}
    fn on_row(&mut self, _event: &RowEvent<'_>) {}
    /// Fired when the file-position percentage changes; at most 101 times
    /// per operation.
    fn on_progress(&mut self, _rows: u64, _table: &str, _pct: i32) {}
}

/// Sink that discards every event.
impl DumpSink for () {}

/// Cloneable handle for cancelling a running operation from another
/// thread. Cancellation is observed at row/record granularity.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Optional schema/table filter, matched case-insensitively against the
/// identifiers decoded from the dump.
#[derive(Debug, Clone)]
pub(crate) struct TableFilter {
    pub schema: Option<String>,
    pub table: String,
}

/// One dump file and everything needed to parse it.
pub struct Session {
    pub(crate) path: PathBuf,
    pub(crate) size: u64,
    pub(crate) kind: Option<DumpKind>,
    pub(crate) dump_charset: Charset,
    pub(crate) out_charset: Charset,
    pub(crate) date_format: DateFormat,
    /// Schema recorded in the EXPDP file header, if any.
    pub(crate) header_schema: Option<String>,

    pub(crate) table: Table,
    pub(crate) tables: Vec<TableEntry>,
    pub(crate) record: Record,
    pub(crate) meta_cache: MetaCache,

    pub(crate) filter: Option<TableFilter>,
    /// Current table fails the filter; its records are skipped.
    pub(crate) pass_current: bool,
    pub(crate) seek_offset: u64,

    cancelled: Arc<AtomicBool>,
    pub(crate) last_error: Option<String>,
    pub(crate) total_rows: u64,
    pub(crate) last_progress_pct: i32,
}

impl Session {
    /// Open a session for the given dump file. The file must exist; its
    /// size anchors progress reporting.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("dump file path is empty"));
        }
        let size = std::fs::metadata(path)?.len();

        Ok(Self {
            path: path.to_path_buf(),
            size,
            kind: None,
            dump_charset: Charset::Utf8,
            out_charset: Charset::Utf8,
            date_format: DateFormat::Slash,
            header_schema: None,
            table: Table::empty(Charset::Utf8),
            tables: Vec::new(),
            record: Record::default(),
            meta_cache: MetaCache::default(),
            filter: None,
            pass_current: false,
            seek_offset: 0,
            cancelled: Arc::new(AtomicBool::new(false)),
            last_error: None,
            total_rows: 0,
            last_progress_pct: -1,
        })
    }

    /// Classify the dump file and fix its source charset.
    pub fn detect(&mut self) -> Result<DumpKind> {
        match detect::detect(&self.path) {
            Ok(d) => {
                info!(
                    "{}: detected {:?}, charset {:?}",
                    self.path.display(),
                    d.kind,
                    d.charset
                );
                self.kind = Some(d.kind);
                self.dump_charset = d.charset;
                self.header_schema = d.schema;
                Ok(d.kind)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// List the tables in the dump. Fires `on_table` per table with a zero
    /// row count; record regions are skipped, not decoded.
    pub fn list_tables(&mut self, sink: &mut dyn DumpSink) -> Result<()> {
        self.run(sink, true)
    }

    /// Fully parse the dump, firing `on_table`, `on_row` and
    /// `on_progress`. Does not return until the dump is consumed, an
    /// error occurs or cancellation is observed.
    pub fn parse(&mut self, sink: &mut dyn DumpSink) -> Result<()> {
        self.run(sink, false)
    }

    fn run(&mut self, sink: &mut dyn DumpSink, list_only: bool) -> Result<()> {
        if self.kind.is_none() {
            self.detect()?;
        }

        // Reset per-operation state; the cancel flag re-arms so a token
        // from a previous run does not abort this one.
        self.cancelled.store(false, Ordering::Relaxed);
        self.tables.clear();
        self.total_rows = 0;
        self.last_progress_pct = -1;
        self.meta_cache.invalidate();
        self.pass_current = false;
        self.table = Table::empty(self.dump_charset);

        let result = match self.kind.expect("kind set above") {
            DumpKind::Exp | DumpKind::ExpDirect => exp::parse(self, sink, list_only),
            DumpKind::Expdp => expdp::parse(self, sink, list_only),
            DumpKind::ExpdpCompressed => {
                Err(Error::unsupported("compressed EXPDP record decoding"))
            }
        };

        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }

    // --- configuration -------------------------------------------------

    /// Charset for decoded character values delivered to sinks.
    pub fn set_output_charset(&mut self, charset: Charset) {
        self.out_charset = charset;
    }

    /// Output format for DATE / TIMESTAMP values.
    pub fn set_date_format(&mut self, format: DateFormat) {
        self.date_format = format;
    }

    /// Restrict parsing to one table. Matching is case-insensitive; a
    /// `None` schema matches any schema.
    pub fn set_table_filter(&mut self, schema: Option<&str>, table: &str) -> Result<()> {
        if table.is_empty() {
            return Err(Error::invalid_argument("filter table name is empty"));
        }
        self.filter = Some(TableFilter {
            schema: schema.filter(|s| !s.is_empty()).map(str::to_string),
            table: table.to_string(),
        });
        self.pass_current = false;
        Ok(())
    }

    /// Remove the table filter; all tables parse again.
    pub fn clear_table_filter(&mut self) {
        self.filter = None;
        self.pass_current = false;
    }

    /// Jump-start a filtered parse at a DDL offset previously reported
    /// through [`TableEvent::ddl_offset`]. Zero disables.
    pub fn set_seek_offset(&mut self, offset: u64) {
        self.seek_offset = offset;
    }

    /// Handle for cancelling from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            flag: Arc::clone(&self.cancelled),
        }
    }

    // --- accessors -----------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.size
    }

    /// Detected format, once `detect` (or an operation) has run.
    pub fn dump_kind(&self) -> Option<DumpKind> {
        self.kind
    }

    pub fn dump_charset(&self) -> Charset {
        self.dump_charset
    }

    /// Table catalogue built by the latest listing operation.
    pub fn tables(&self) -> &[TableEntry] {
        &self.tables
    }

    /// Rows delivered by the latest parse operation.
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Last reported progress percentage, `-1` before the first report.
    pub fn progress_pct(&self) -> i32 {
        self.last_progress_pct
    }

    /// Message of the most recent failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // --- internals shared by the parsers -------------------------------

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }

    /// True when the filter allows the given table.
    pub(crate) fn filter_matches(&self, schema: &str, table: &str) -> bool {
        match &self.filter {
            None => true,
            Some(f) => {
                table.eq_ignore_ascii_case(&f.table)
                    && f.schema
                        .as_deref()
                        .is_none_or(|fs| schema.eq_ignore_ascii_case(fs))
            }
        }
    }

    pub(crate) fn filter_active(&self) -> bool {
        self.filter.is_some()
    }

    /// Report progress if the file-position percentage changed.
    pub(crate) fn report_progress(&mut self, pos: u64, sink: &mut dyn DumpSink) {
        if self.size == 0 {
            return;
        }
        let pct = (pos.saturating_mul(100) / self.size).min(100) as i32;
        if pct != self.last_progress_pct {
            self.last_progress_pct = pct;
            self.meta_cache.update(&self.table);
            sink.on_progress(self.total_rows, &self.meta_cache.name, pct);
        }
    }

    /// Deliver the current record as a row event.
    ///
    /// The record is padded to the table's column count first, so the
    /// name/value arrays are always parallel; undecoded columns surface
    /// as nulls.
    pub(crate) fn deliver_row(&mut self, sink: &mut dyn DumpSink) {
        self.meta_cache.update(&self.table);
        self.record.set_col_count(self.table.column_count());
        let event = RowEvent {
            schema: &self.meta_cache.schema,
            table: &self.meta_cache.name,
            col_names: &self.meta_cache.col_names,
            values: self.record.values(),
        };
        sink.on_row(&event);
        self.total_rows += 1;
        self.table.record_count += 1;
    }

    /// Append the current table to the catalogue and fire the table event.
    pub(crate) fn notify_table(&mut self, sink: &mut dyn DumpSink, row_count: u64) {
        self.meta_cache.update(&self.table);
        self.tables.push(TableEntry {
            schema: self.meta_cache.schema.clone(),
            name: self.meta_cache.name.clone(),
            col_count: self.table.column_count(),
            row_count,
        });
        let event = TableEvent {
            schema: &self.meta_cache.schema,
            table: &self.meta_cache.name,
            col_names: &self.meta_cache.col_names,
            col_types: &self.meta_cache.col_types,
            row_count,
            ddl_offset: self.table.ddl_offset,
        };
        sink.on_table(&event);
    }
}
