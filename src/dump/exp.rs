//! Legacy EXP (conventional-path export) format parser.
//!
//! EXP files interleave ASCII DDL text with binary data:
//! - 256-byte header (version, export scope, charsets)
//! - DDL statements terminated by `\0` or `\n` (`CONNECT`, `CREATE TABLE`,
//!   `INSERT INTO`)
//! - after an `INSERT INTO` matching the current table: a binary column
//!   metadata block, zero padding, then length-prefixed record data
//! - `0xFFFF` ends a table's records and DDL scanning resumes
//!
//! Corrupt record structure is recovered by sliding a two-byte window
//! forward until the `0xFFFF` table-end marker reappears.

use log::{debug, warn};

use crate::dump::charset;
use crate::dump::constants::*;
use crate::dump::detect::DumpKind;
use crate::dump::io::DumpReader;
use crate::dump::types::record::decode_column;
use crate::dump::types::{Column, Table};
use crate::error::{Error, Result};
use crate::session::{DumpSink, Session};

/// Parse an EXP dump. `list_only` skips record regions and reports tables
/// with a zero row count.
pub(crate) fn parse(session: &mut Session, sink: &mut dyn DumpSink, list_only: bool) -> Result<()> {
    let mut reader = DumpReader::open(&session.path)?;
    parse_header(session, &mut reader)?;

    let mut parser = ExpParser {
        s: session,
        r: reader,
        list_only,
        state: ScanState::ModeSniff,
        word: Vec::new(),
        current_schema: String::new(),
        pending_table: false,
        filter_found: false,
        meta: MetaCtx::default(),
    };
    parser.run(sink)
}

/// Export scope recorded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpMode {
    Table,
    User,
    Database,
}

/// Top-level scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Accumulate text until something DDL-shaped appears.
    ModeSniff,
    /// Accumulate and dispatch DDL statements.
    Ddl,
    /// Fixed binary layout following a matched `INSERT INTO`.
    Meta,
}

/// Sub-state inside the binary metadata block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum MetaStep {
    #[default]
    ColCountLo,
    ColCountHi,
    ColType,
    NullFlag,
    LenLo,
    LenHi,
    /// Four trailing charset bytes for character-typed columns.
    Charset(u8),
    LobCountLo,
    LobCountHi,
    /// Zero-padding and name-length bytes between LOB names.
    LobScan,
    LobName,
    /// Zero padding before record data.
    Padding,
}

#[derive(Debug, Default)]
struct MetaCtx {
    step: MetaStep,
    col_count: usize,
    col_idx: usize,
    is_char_type: bool,
    byte0: u8,
    lob_idx: usize,
    null_count: usize,
}

enum Flow {
    Continue,
    Done,
}

struct ExpParser<'a> {
    s: &'a mut Session,
    r: DumpReader,
    list_only: bool,
    state: ScanState,
    word: Vec<u8>,
    current_schema: String,
    pending_table: bool,
    /// The filter's target table has been processed; the next
    /// non-matching table ends the scan early.
    filter_found: bool,
    meta: MetaCtx,
}

impl ExpParser<'_> {
    fn run(&mut self, sink: &mut dyn DumpSink) -> Result<()> {
        // A seek offset from a prior listing jumps straight to the target
        // table's DDL; the header (charset) is already parsed.
        if self.s.seek_offset > EXP_HEADER_SIZE && self.s.filter_active() {
            let offset = self.s.seek_offset;
            debug!("fast seek to DDL offset {:#x}", offset);
            self.r.seek_to(offset)?;
            self.state = ScanState::Ddl;
            if let Some(f) = &self.s.filter {
                if let Some(schema) = &f.schema {
                    self.current_schema = schema.clone();
                }
            }
        } else {
            self.r.seek_to(EXP_HEADER_SIZE)?;
        }

        loop {
            self.s.check_cancelled()?;
            let Some(c) = self.r.read_u8()? else {
                break;
            };

            // Keep the percentage fresh during long DDL/metadata stretches.
            if self.r.position() & 0xFFFF == 0 {
                self.s.report_progress(self.r.position(), sink);
            }

            let flow = match self.state {
                ScanState::ModeSniff | ScanState::Ddl => self.on_text_byte(c, sink)?,
                ScanState::Meta => self.on_meta_byte(c, sink)?,
            };
            if let Flow::Done = flow {
                break;
            }
        }

        // A table whose records never arrived still gets announced.
        if self.pending_table && !self.s.table.name.is_empty() && self.should_notify() {
            let rows = self.s.table.record_count;
            self.s.notify_table(sink, rows);
        }
        Ok(())
    }

    // --- DDL text ------------------------------------------------------

    fn on_text_byte(&mut self, c: u8, sink: &mut dyn DumpSink) -> Result<Flow> {
        if c != 0x00 && c != 0x0A {
            if self.word.len() < DDL_BUF_LEN {
                self.word.push(c);
            }
            return Ok(Flow::Continue);
        }

        if self.word.is_empty() {
            return Ok(Flow::Continue);
        }
        let statement = charset::decode_to_string(&self.word, self.s.dump_charset);
        let word_len = self.word.len() as u64;
        self.word.clear();

        if self.state == ScanState::ModeSniff {
            if !is_ddl_statement(&statement) {
                return Ok(Flow::Continue);
            }
            self.state = ScanState::Ddl;
        }

        self.on_ddl_statement(&statement, word_len, sink)
    }

    fn on_ddl_statement(
        &mut self,
        stmt: &str,
        word_len: u64,
        sink: &mut dyn DumpSink,
    ) -> Result<Flow> {
        let b = stmt.as_bytes();

        if starts_with_ci(b, b"CONNECT ") {
            let (schema, _) = extract_identifier(&b[8..]);
            if !schema.is_empty() {
                debug!("CONNECT {}", schema);
                self.current_schema = schema;
            }
        } else if starts_with_ci(b, b"CREATE ") {
            let after = skip_ws(&b[7..]);
            // "TABLE" but not "TABLESPACE"
            if starts_with_ci(after, b"TABLE")
                && after
                    .get(5)
                    .is_none_or(|&c| c <= b' ' || c == b'"')
            {
                return self.on_create_table(stmt, word_len, sink);
            }
        } else if starts_with_ci(b, b"INSERT INTO ") {
            // The metadata block follows only when the INSERT targets the
            // table of the most recent CREATE TABLE; other INSERTs are
            // embedded DDL and stay in text scanning.
            let (first, rest) = extract_identifier(&b[12..]);
            let rest = skip_ws(rest);
            let target = if rest.first() == Some(&b'.') {
                extract_identifier(&rest[1..]).0
            } else {
                first
            };
            if !self.s.table.name.is_empty() && self.s.table.name == target {
                debug!(
                    "INSERT INTO \"{}\" matched at {:#x}",
                    target,
                    self.r.position()
                );
                self.state = ScanState::Meta;
                self.meta = MetaCtx::default();
            }
        }

        Ok(Flow::Continue)
    }

    fn on_create_table(
        &mut self,
        stmt: &str,
        word_len: u64,
        sink: &mut dyn DumpSink,
    ) -> Result<Flow> {
        // A previous table that never saw an INSERT INTO has no records.
        if self.pending_table && !self.s.table.name.is_empty() && self.should_notify() {
            self.s.notify_table(sink, 0);
        }
        self.pending_table = false;

        let Some((schema, name, columns)) = parse_create_table(stmt) else {
            return Ok(Flow::Continue);
        };

        let mut table = Table::new(&schema, &name, self.s.dump_charset);
        if table.schema.is_empty() && !self.current_schema.is_empty() {
            table.schema = self.current_schema.clone();
        }
        table.columns = columns;
        table.update_lob_count();
        // Position of the statement's first byte, for later fast seeks.
        table.ddl_offset = self.r.position() - word_len - 1;
        debug!(
            "CREATE TABLE {}.{} ({} columns, {} LOB) at {:#x}",
            table.schema,
            table.name,
            table.column_count(),
            table.lob_col_count,
            table.ddl_offset
        );

        self.s.table = table;
        self.s.meta_cache.invalidate();
        self.pending_table = true;

        if self.s.filter_active() {
            let matched = self
                .s
                .filter_matches(&self.s.table.schema, &self.s.table.name);
            self.s.pass_current = !matched;
            // The target was already handled and a different table starts:
            // nothing further in the file is relevant.
            if self.filter_found && self.s.pass_current {
                self.pending_table = false;
                return Ok(Flow::Done);
            }
            if matched {
                self.filter_found = true;
            }
        }

        Ok(Flow::Continue)
    }

    // --- binary metadata ----------------------------------------------

    fn on_meta_byte(&mut self, c: u8, sink: &mut dyn DumpSink) -> Result<Flow> {
        match self.meta.step {
            MetaStep::ColCountLo => {
                self.meta.byte0 = c;
                self.meta.step = MetaStep::ColCountHi;
            }
            MetaStep::ColCountHi => {
                let count = u16::from_le_bytes([self.meta.byte0, c]) as usize;
                debug!("metadata column count {}", count);
                if count == 0 || count > MAX_COLUMNS {
                    self.abort_table();
                } else {
                    self.meta.col_count = count;
                    self.meta.col_idx = 0;
                    self.meta.step = MetaStep::ColType;
                }
            }
            MetaStep::ColType => {
                if c == EXP_META_TYPE_XMLTYPE {
                    debug!("XMLTYPE column, table skipped");
                    self.abort_table();
                } else {
                    self.meta.is_char_type = EXP_META_CHAR_TYPES.contains(&c);
                    self.meta.step = MetaStep::NullFlag;
                }
            }
            MetaStep::NullFlag => {
                self.meta.step = MetaStep::LenLo;
            }
            MetaStep::LenLo => {
                self.meta.step = MetaStep::LenHi;
            }
            MetaStep::LenHi => {
                self.meta.col_idx += 1;
                if self.meta.is_char_type {
                    self.meta.step = MetaStep::Charset(0);
                } else {
                    self.after_column_entry();
                }
            }
            MetaStep::Charset(n) => {
                if n < 3 {
                    self.meta.step = MetaStep::Charset(n + 1);
                } else {
                    self.after_column_entry();
                }
            }
            MetaStep::LobCountLo => {
                self.meta.byte0 = c;
                self.meta.step = MetaStep::LobCountHi;
            }
            MetaStep::LobCountHi => {
                let total = u16::from_le_bytes([self.meta.byte0, c]);
                debug!("LOB name block, {} entries", total);
                self.meta.lob_idx = 0;
                self.meta.step = MetaStep::LobScan;
            }
            MetaStep::LobScan => {
                if c == 0xFF {
                    // End marker inside the LOB section: no record data.
                    self.state = ScanState::Ddl;
                } else if c != 0x00 {
                    if self.meta.null_count > 0 {
                        // First non-zero byte after padding is the name
                        // length; the name bytes themselves are skipped.
                        self.meta.step = MetaStep::LobName;
                    }
                    self.meta.null_count += 1;
                } else {
                    self.meta.null_count += 1;
                }
            }
            MetaStep::LobName => {
                // Name entries are delimited by any byte below 0x04.
                if c < 0x04 {
                    self.meta.lob_idx += 1;
                    if self.meta.lob_idx >= self.s.table.lob_col_count {
                        self.meta.null_count = 0;
                        self.meta.step = MetaStep::Padding;
                    } else {
                        self.meta.step = MetaStep::LobScan;
                    }
                }
            }
            MetaStep::Padding => return self.on_padding_byte(c, sink),
        }
        Ok(Flow::Continue)
    }

    /// A column's metadata entry is complete; move to the next column, the
    /// LOB block, or the final padding.
    fn after_column_entry(&mut self) {
        if self.meta.col_idx >= self.meta.col_count {
            // The LOB name block's presence is driven by the DDL-parsed
            // LOB count, not by the metadata bytes.
            if self.s.table.lob_col_count > 0 {
                self.meta.step = MetaStep::LobCountLo;
            } else {
                self.meta.null_count = 0;
                self.meta.step = MetaStep::Padding;
            }
        } else {
            self.meta.step = MetaStep::ColType;
        }
    }

    fn on_padding_byte(&mut self, c: u8, sink: &mut dyn DumpSink) -> Result<Flow> {
        if c == 0x00 {
            self.meta.null_count += 1;
            return Ok(Flow::Continue);
        }
        if c == 0xFF {
            // No record data for this table.
            debug!("0xFF in padding at {:#x}, no records", self.r.position());
            if self.should_notify() {
                self.s.notify_table(sink, 0);
            }
            self.pending_table = false;
            self.state = ScanState::Ddl;
            return Ok(Flow::Continue);
        }

        // Direct-path dumps pad with at least three zero bytes; earlier
        // non-zero bytes are still metadata noise.
        if self.s.kind == Some(DumpKind::ExpDirect) && self.meta.null_count < 3 {
            return Ok(Flow::Continue);
        }

        // First byte of record data: rewind so record parsing rereads the
        // full two-byte length prefix.
        self.r.rewind_one()?;
        debug!(
            "record data starts at {:#x} (padding {})",
            self.r.position(),
            self.meta.null_count
        );

        if self.list_only {
            self.scan_to_table_end(sink)?;
            self.s.notify_table(sink, 0);
        } else if self.s.filter_active() && self.s.pass_current {
            self.scan_to_table_end(sink)?;
        } else {
            self.parse_records(sink)?;
            let rows = self.s.table.record_count;
            self.s.notify_table(sink, rows);
        }
        self.pending_table = false;
        self.state = ScanState::Ddl;
        Ok(Flow::Continue)
    }

    // --- binary records ------------------------------------------------

    fn parse_records(&mut self, sink: &mut dyn DumpSink) -> Result<()> {
        let col_count = self.s.table.column_count();
        let col_limit = col_count + self.s.table.lob_col_count + 1;
        self.s.record.ensure_columns(col_count);
        self.s.record.reset();

        let mut col_buf: Vec<u8> = Vec::new();
        let mut col_idx = 0usize;

        loop {
            self.s.check_cancelled()?;
            let Some(prefix) = self.r.read_u16_le()? else {
                break; // truncated file
            };

            match prefix {
                EXP_LEN_ROW_END => {
                    if col_idx > 0 {
                        self.s.deliver_row(sink);
                        self.s.report_progress(self.r.position(), sink);
                    }
                    self.s.record.reset();
                    col_idx = 0;
                }
                EXP_LEN_TABLE_END => {
                    debug!(
                        "table end after {} rows at {:#x}",
                        self.s.table.record_count,
                        self.r.position()
                    );
                    break;
                }
                EXP_LEN_NULL => {
                    if col_idx < col_count {
                        self.s.record.value_mut(col_idx).set_null();
                    }
                    col_idx += 1;
                }
                _ => {
                    let len = if prefix == EXP_LEN_ESCAPE {
                        // Oversized value: the real length follows as u32.
                        match self.r.read_u32_le()? {
                            Some(l) => l as usize,
                            None => break,
                        }
                    } else {
                        prefix as usize
                    };

                    if self.bad_column_length(col_idx, len) {
                        warn!(
                            "column length {} out of range for column {} at {:#x}, resyncing",
                            len,
                            col_idx,
                            self.r.position()
                        );
                        self.scan_to_table_end(sink)?;
                        break;
                    }

                    col_buf.resize(len, 0);
                    if !self.r.read_exact(&mut col_buf)? {
                        break; // truncated value at EOF
                    }

                    if col_idx < col_count {
                        let s = &mut *self.s;
                        let col = &s.table.columns[col_idx];
                        let value = s.record.value_mut(col_idx);
                        decode_column(
                            col,
                            &col_buf,
                            s.table.charset,
                            s.out_charset,
                            s.date_format,
                            value,
                        );
                    }
                    col_idx += 1;

                    // More columns than the table declares means the
                    // record structure is corrupt.
                    if col_idx > col_limit {
                        warn!(
                            "column index {} exceeds declared columns at {:#x}, resyncing",
                            col_idx,
                            self.r.position()
                        );
                        self.scan_to_table_end(sink)?;
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Per-type plausibility limit for an encoded column length.
    fn bad_column_length(&self, col_idx: usize, len: usize) -> bool {
        if len > MAX_RECORD_LEN {
            return true;
        }
        if let Some(col) = self.s.table.columns.get(col_idx) {
            if let Some(max) = col.ctype.max_encoded_len() {
                return len > max;
            }
        }
        false
    }

    /// Corruption recovery and record skipping: slide a two-byte window
    /// forward one byte at a time until the `0xFFFF` table-end marker.
    /// Hitting end of file first is a distinct error rather than an
    /// unbounded loop.
    fn scan_to_table_end(&mut self, sink: &mut dyn DumpSink) -> Result<()> {
        let start = self.r.position();
        let mut scanned: u64 = 0;
        loop {
            self.s.check_cancelled()?;
            let mut pair = [0u8; 2];
            if !self.r.read_exact(&mut pair)? {
                return Err(Error::TableEndNotFound { offset: start });
            }
            if pair == [0xFF, 0xFF] {
                return Ok(());
            }
            self.r.rewind_one()?;
            scanned += 1;
            if scanned & 0x7FFF == 0 {
                self.s.report_progress(self.r.position(), sink);
            }
        }
    }

    /// Listing announces every table (zero rows for filtered-out ones);
    /// a full parse announces only tables that pass the filter.
    fn should_notify(&self) -> bool {
        self.list_only || !(self.s.filter_active() && self.s.pass_current)
    }

    /// Abandon the current table's metadata and return to DDL scanning.
    fn abort_table(&mut self) {
        self.s.table.name.clear();
        self.pending_table = false;
        self.state = ScanState::Ddl;
    }
}

// --- header ------------------------------------------------------------

/// Parse the 256-byte EXP header: Oracle version, export scope and
/// charset, in `\0`/`\n`-delimited fields starting at offset 6.
fn parse_header(session: &mut Session, reader: &mut DumpReader) -> Result<()> {
    reader.seek_to(0)?;
    let mut hdr = [0u8; EXP_HEADER_SIZE as usize];
    if !reader.read_exact(&mut hdr)? {
        return Err(Error::format("Cannot read EXP header"));
    }

    // Direct-path exports mark themselves with "D\n" near the start.
    for w in hdr[..32].windows(2) {
        if w == b"D\n" {
            session.kind = Some(DumpKind::ExpDirect);
            break;
        }
    }

    let mut version = 0u32;
    let mut mode = ExpMode::Table;
    let mut word: Vec<u8> = Vec::new();
    let mut rec = 0;

    for &c in &hdr[6..] {
        if c != 0x00 && c != 0x0A {
            if word.len() < 255 {
                word.push(c);
            }
            continue;
        }
        match rec {
            0 => {
                // Oracle version, e.g. "V11.02.00"
                let digits = if word.first() == Some(&b'V') || word.first() == Some(&b'v') {
                    &word[1..]
                } else {
                    word.get(2..).unwrap_or(&[])
                };
                version = leading_u32(digits);
            }
            2 => {
                if word.starts_with(b"RTABLES") {
                    mode = ExpMode::Table;
                } else if word.starts_with(b"RUSERS") {
                    mode = ExpMode::User;
                } else if word.starts_with(b"RENTIRE") {
                    mode = ExpMode::Database;
                }
            }
            7 => {
                // Charset field: byte 3 carries the database charset,
                // byte 1 the environment charset as fallback.
                if let Some(&b) = word.get(3) {
                    session.dump_charset = charset::Charset::from_exp_header_byte(b);
                } else if let Some(&b) = word.get(1) {
                    session.dump_charset = charset::Charset::from_exp_header_byte(b);
                }
            }
            _ => {}
        }
        rec += 1;
        word.clear();
        if rec > 7 {
            break;
        }
    }

    debug!(
        "EXP header: version {}, mode {:?}, charset {:?}",
        version, mode, session.dump_charset
    );
    Ok(())
}

fn leading_u32(b: &[u8]) -> u32 {
    let end = b.iter().position(|c| !c.is_ascii_digit()).unwrap_or(b.len());
    std::str::from_utf8(&b[..end])
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

// --- DDL text helpers ---------------------------------------------------

fn is_ddl_statement(stmt: &str) -> bool {
    let b = stmt.as_bytes();
    starts_with_ci(b, b"CREATE ")
        || starts_with_ci(b, b"CONNECT ")
        || starts_with_ci(b, b"ALTER ")
        || starts_with_ci(b, b"GRANT ")
        || starts_with_ci(b, b"INSERT ")
}

fn starts_with_ci(b: &[u8], prefix: &[u8]) -> bool {
    b.len() >= prefix.len() && b[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn skip_ws(b: &[u8]) -> &[u8] {
    let mut i = 0;
    while i < b.len() && b[i] <= b' ' {
        i += 1;
    }
    &b[i..]
}

/// Extract a `"quoted"` or bare identifier; returns it with the remaining
/// input.
fn extract_identifier(b: &[u8]) -> (String, &[u8]) {
    let b = skip_ws(b);
    if b.first() == Some(&b'"') {
        let rest = &b[1..];
        match rest.iter().position(|&c| c == b'"') {
            Some(i) => (
                String::from_utf8_lossy(&rest[..i]).into_owned(),
                &rest[i + 1..],
            ),
            None => (String::from_utf8_lossy(rest).into_owned(), &[]),
        }
    } else {
        let end = b
            .iter()
            .position(|&c| matches!(c, b' ' | b',' | b'(' | b')' | b'\t' | b'\n' | b'\r'))
            .unwrap_or(b.len());
        (String::from_utf8_lossy(&b[..end]).into_owned(), &b[end..])
    }
}

/// Parse a `CREATE TABLE` statement into schema, table name and columns.
///
/// Constraint entries and `DEFAULT`/`NOT NULL` tails are skipped with
/// nested-parenthesis awareness; anything without a parenthesized column
/// list is not a table definition.
fn parse_create_table(stmt: &str) -> Option<(String, String, Vec<Column>)> {
    let mut p = stmt.as_bytes();

    // Locate "CREATE <ws> TABLE".
    let mut after_table: Option<&[u8]> = None;
    while !p.is_empty() {
        if starts_with_ci(p, b"CREATE") && p.get(6).is_some_and(|&c| c <= b' ') {
            let rest = skip_ws(&p[6..]);
            if starts_with_ci(rest, b"TABLE")
                && rest.get(5).is_none_or(|&c| c <= b' ' || c == b'"')
            {
                after_table = Some(&rest[5..]);
                break;
            }
        }
        p = &p[1..];
    }
    let p = after_table?;

    let (first, rest) = extract_identifier(p);
    let rest = skip_ws(rest);
    let (schema, name, rest) = if rest.first() == Some(&b'.') {
        let (table, r) = extract_identifier(&rest[1..]);
        (first, table, skip_ws(r))
    } else {
        (String::new(), first, rest)
    };
    if name.is_empty() || rest.first() != Some(&b'(') {
        return None;
    }

    let mut p = &rest[1..];
    let mut columns = Vec::new();
    while !p.is_empty() && columns.len() < MAX_COLUMNS {
        p = skip_ws(p);
        if p.first() == Some(&b')') {
            break;
        }

        let (col_name, rest) = extract_identifier(p);
        p = rest;
        if col_name.is_empty() {
            break;
        }

        // Table-level constraint entries are not columns.
        let cb = col_name.as_bytes();
        if starts_with_ci(cb, b"CONSTRAINT")
            || starts_with_ci(cb, b"PRIMARY")
            || starts_with_ci(cb, b"UNIQUE")
            || starts_with_ci(cb, b"FOREIGN")
            || starts_with_ci(cb, b"CHECK")
        {
            p = skip_constraint_entry(p);
            continue;
        }

        p = skip_ws(p);
        let (type_str, rest) = extract_type_str(p);
        p = rest;
        if !type_str.is_empty() {
            columns.push(Column::from_ddl(&col_name, &type_str));
        }
    }

    Some((schema, name, columns))
}

/// Skip a constraint entry up to the next comma at depth zero; the
/// closing parenthesis of the column list is left unconsumed.
fn skip_constraint_entry(b: &[u8]) -> &[u8] {
    let mut depth = 0u32;
    let mut i = 0;
    while i < b.len() {
        match b[i] {
            b'(' => depth += 1,
            b')' => {
                if depth == 0 {
                    return &b[i..];
                }
                depth -= 1;
            }
            b',' if depth == 0 => return &b[i + 1..],
            _ => {}
        }
        i += 1;
    }
    &[]
}

/// Extract a column's type string up to the next comma or the end of the
/// column list, stopping before `NOT NULL`/`DEFAULT`/`CONSTRAINT` tails
/// (skipping nested parentheses in default expressions).
fn extract_type_str(b: &[u8]) -> (String, &[u8]) {
    let mut out: Vec<u8> = Vec::new();
    let mut depth = 0u32;
    let mut i = 0;

    while i < b.len() && out.len() < 250 {
        let c = b[i];
        if c == b'(' {
            depth += 1;
            out.push(c);
            i += 1;
        } else if c == b')' {
            if depth > 0 {
                depth -= 1;
                out.push(c);
                i += 1;
            } else {
                break; // end of the column list
            }
        } else if c == b',' && depth == 0 {
            i += 1;
            break;
        } else if starts_with_ci(&b[i..], b"NOT ")
            || starts_with_ci(&b[i..], b"DEFAULT ")
            || starts_with_ci(&b[i..], b"CONSTRAINT ")
        {
            while i < b.len() && b[i] != b',' && b[i] != b')' {
                if b[i] == b'(' {
                    let mut d = 1;
                    i += 1;
                    while i < b.len() && d > 0 {
                        match b[i] {
                            b'(' => d += 1,
                            b')' => d -= 1,
                            _ => {}
                        }
                        i += 1;
                    }
                } else {
                    i += 1;
                }
            }
            if b.get(i) == Some(&b',') {
                i += 1;
            }
            break;
        } else {
            out.push(c);
            i += 1;
        }
    }

    let text = String::from_utf8_lossy(&out).trim_end().to_string();
    (text, &b[i.min(b.len())..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::types::ColumnType;

    #[test]
    fn test_extract_identifier_quoted_and_bare() {
        let (id, rest) = extract_identifier(b"\"EMP\" (");
        assert_eq!(id, "EMP");
        assert_eq!(rest, b" (");

        let (id, rest) = extract_identifier(b"  SCOTT.EMP");
        assert_eq!(id, "SCOTT");
        assert_eq!(rest, b".EMP");
    }

    #[test]
    fn test_parse_create_table_basic() {
        let (schema, name, cols) = parse_create_table(
            "CREATE TABLE \"EMP\" (\"EMPNO\" NUMBER(4), \"ENAME\" VARCHAR2(10), \"HIREDATE\" DATE)",
        )
        .unwrap();
        assert_eq!(schema, "");
        assert_eq!(name, "EMP");
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0].name, "EMPNO");
        assert_eq!(cols[0].ctype, ColumnType::Number);
        assert_eq!(cols[1].type_str, "VARCHAR2(10)");
        assert_eq!(cols[2].ctype, ColumnType::Date);
    }

    #[test]
    fn test_parse_create_table_with_schema() {
        let (schema, name, _) =
            parse_create_table("CREATE TABLE \"SCOTT\".\"DEPT\" (\"DEPTNO\" NUMBER(2))").unwrap();
        assert_eq!(schema, "SCOTT");
        assert_eq!(name, "DEPT");
    }

    #[test]
    fn test_parse_create_table_skips_constraints() {
        let (_, _, cols) = parse_create_table(
            "CREATE TABLE \"T\" (\"A\" NUMBER, CONSTRAINT \"PK_T\" PRIMARY KEY (\"A\"), \"B\" VARCHAR2(5))",
        )
        .unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "A");
        assert_eq!(cols[1].name, "B");
    }

    #[test]
    fn test_parse_create_table_default_with_nested_parens() {
        let (_, _, cols) = parse_create_table(
            "CREATE TABLE \"T\" (\"A\" VARCHAR2(10) DEFAULT SUBSTR('xy', 1, (2)), \"B\" NUMBER NOT NULL)",
        )
        .unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].type_str, "VARCHAR2(10)");
        assert_eq!(cols[1].type_str, "NUMBER");
    }

    #[test]
    fn test_parse_create_table_rejects_tablespace() {
        assert!(parse_create_table("CREATE TABLESPACE users DATAFILE 'x'").is_none());
    }

    #[test]
    fn test_parse_create_table_requires_column_list() {
        assert!(parse_create_table("CREATE TABLE \"T\" AS SELECT 1 FROM DUAL").is_none());
    }

    #[test]
    fn test_is_ddl_statement() {
        assert!(is_ddl_statement("CREATE TABLE X (A NUMBER)"));
        assert!(is_ddl_statement("connect SCOTT"));
        assert!(!is_ddl_statement("METRICST"));
    }
}
