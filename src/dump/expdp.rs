//! DataPump (EXPDP) format parser.
//!
//! EXPDP dumps embed each table's metadata as an XML DDL unit — the bytes
//! from `<?xml` through `</ROWSET>` — followed immediately by that table's
//! binary records. The parser scans the file for DDL units, extracts the
//! column list through the XML reader, then walks the record block using
//! per-row header bytes and per-column length bytes.

use bytes::BytesMut;
use log::{debug, warn};

use crate::dump::charset::{self, Charset};
use crate::dump::constants::*;
use crate::dump::io::DumpReader;
use crate::dump::types::record::{
    decode_column, BFILE_PLACEHOLDER, BLOB_PLACEHOLDER, CLOB_PLACEHOLDER, NCLOB_PLACEHOLDER,
};
use crate::dump::types::{Column, ColumnType, Table};
use crate::dump::xml::{XmlEvent, XmlReader};
use crate::error::Result;
use crate::session::{DumpSink, Session};

/// Cap on a single accumulated DDL unit.
const DDL_UNIT_MAX: usize = 1024 * 1024;

/// Parse an EXPDP dump. `list_only` skips record blocks and reports
/// tables with a zero row count.
pub(crate) fn parse(session: &mut Session, sink: &mut dyn DumpSink, list_only: bool) -> Result<()> {
    let mut reader = DumpReader::open(&session.path)?;

    if session.seek_offset > 0 && session.filter_active() {
        debug!("fast seek to DDL offset {:#x}", session.seek_offset);
        reader.seek_to(session.seek_offset)?;
    }

    let mut parser = ExpdpParser {
        s: session,
        r: reader,
        list_only,
        filter_found: false,
    };
    parser.run(sink)
}

struct ExpdpParser<'a> {
    s: &'a mut Session,
    r: DumpReader,
    list_only: bool,
    filter_found: bool,
}

enum DdlScan {
    Unit(Vec<u8>),
    TooLong,
    Eof,
}

impl ExpdpParser<'_> {
    fn run(&mut self, sink: &mut dyn DumpSink) -> Result<()> {
        loop {
            self.s.check_cancelled()?;

            let Some(ddl_offset) = self.scan_for_xml(sink)? else {
                break;
            };
            let ddl = match self.accumulate_ddl()? {
                DdlScan::Unit(bytes) => bytes,
                DdlScan::TooLong => {
                    warn!("DDL unit at {:#x} exceeds {} bytes, skipped", ddl_offset, DDL_UNIT_MAX);
                    continue;
                }
                DdlScan::Eof => break,
            };

            let decoded = charset::decode_to_string(&ddl, self.s.dump_charset);
            let Some(mut table) = parse_ddl_unit(
                decoded.as_bytes(),
                self.s.header_schema.as_deref().unwrap_or(""),
                self.s.dump_charset,
            ) else {
                debug!("DDL unit at {:#x} holds no table definition", ddl_offset);
                continue;
            };
            table.ddl_offset = ddl_offset;

            // Oracle's own DataPump bookkeeping table is noise.
            if table.is_dictionary_table() {
                debug!("dictionary table {} skipped", table.name);
                continue;
            }

            debug!(
                "EXPDP table {}.{} ({} columns) at {:#x}",
                table.schema,
                table.name,
                table.column_count(),
                ddl_offset
            );
            self.s.table = table;
            self.s.meta_cache.invalidate();

            if self.s.filter_active() {
                let matched = self
                    .s
                    .filter_matches(&self.s.table.schema, &self.s.table.name);
                self.s.pass_current = !matched;
                // Target already processed and a different table begins.
                if self.filter_found && self.s.pass_current {
                    break;
                }
                if matched {
                    self.filter_found = true;
                }
            }

            if self.list_only {
                // Records are skipped by scanning on to the next DDL unit.
                self.s.notify_table(sink, 0);
                continue;
            }
            if self.s.filter_active() && self.s.pass_current {
                continue;
            }

            let rows = self.parse_records(sink)?;
            self.s.notify_table(sink, rows);
        }
        Ok(())
    }

    /// Scan forward for the next `<?xml`. Returns the marker's offset with
    /// the reader positioned just past it, or `None` at end of file.
    fn scan_for_xml(&mut self, sink: &mut dyn DumpSink) -> Result<Option<u64>> {
        let pat = EXPDP_XML_START;
        let mut matched = 0usize;
        loop {
            if self.r.position() & 0xFFFF == 0 {
                self.s.check_cancelled()?;
                self.s.report_progress(self.r.position(), sink);
            }
            let Some(c) = self.r.read_u8()? else {
                return Ok(None);
            };
            if c == pat[matched] {
                matched += 1;
                if matched == pat.len() {
                    return Ok(Some(self.r.position() - pat.len() as u64));
                }
            } else {
                matched = if c == pat[0] { 1 } else { 0 };
            }
        }
    }

    /// Accumulate one DDL unit: from the already-consumed `<?xml` through
    /// the closing `</ROWSET>`. The buffer grows geometrically with the
    /// unit.
    fn accumulate_ddl(&mut self) -> Result<DdlScan> {
        let end = EXPDP_DDL_END;
        let mut buf = BytesMut::from(EXPDP_XML_START);
        let mut matched = 0usize;
        loop {
            let Some(c) = self.r.read_u8()? else {
                return Ok(DdlScan::Eof);
            };
            buf.extend_from_slice(&[c]);
            if buf.len() > DDL_UNIT_MAX {
                return Ok(DdlScan::TooLong);
            }
            if c == end[matched] {
                matched += 1;
                if matched == end.len() {
                    return Ok(DdlScan::Unit(buf.to_vec()));
                }
            } else {
                matched = if c == end[0] { 1 } else { 0 };
            }
        }
    }

    // --- binary records ------------------------------------------------

    /// Decode the record block that follows a DDL unit. Returns the
    /// number of rows delivered.
    fn parse_records(&mut self, sink: &mut dyn DumpSink) -> Result<u64> {
        let col_count = self.s.table.column_count();
        self.s.record.ensure_columns(col_count);
        let mut rows = 0u64;

        loop {
            self.s.check_cancelled()?;
            let Some(header) = self.r.read_u8()? else {
                break;
            };

            let over255 = EXPDP_REC_OVER255.contains(&header);
            match header {
                EXPDP_REC_END_00 | EXPDP_REC_END_FF => break,
                EXPDP_REC_SINGLE_LOB => {
                    // One out-of-row LOB chunk; no row is delivered.
                    if !self.skip_lob_chunk()? {
                        break;
                    }
                    continue;
                }
                EXPDP_REC_NORMAL_01 | EXPDP_REC_NORMAL_04 | EXPDP_REC_LOB_08
                | EXPDP_REC_LOB_09 => {}
                _ if over255 => {}
                _ => {
                    debug!(
                        "unknown record header {:#02x} at {:#x}, table data ends",
                        header,
                        self.r.position()
                    );
                    break;
                }
            }

            if !self.read_row(over255)? {
                break;
            }
            self.s.deliver_row(sink);
            rows += 1;
            self.s.report_progress(self.r.position(), sink);
        }
        Ok(rows)
    }

    /// Read one row's column values. A row completes once the non-LOB
    /// column count of values has been consumed; LOB columns render as
    /// placeholders without consuming stream bytes. Returns `false` on a
    /// truncated stream.
    fn read_row(&mut self, over255: bool) -> Result<bool> {
        self.s.record.reset();
        let col_count = self.s.table.column_count();
        let mut col_buf: Vec<u8> = Vec::new();
        let mut consumed = 0usize;

        for idx in 0..col_count {
            if self.s.table.columns[idx].ctype.is_lob_category() {
                let ctype = self.s.table.columns[idx].ctype;
                self.s
                    .record
                    .value_mut(idx)
                    .set_text(lob_placeholder(ctype), ctype);
                continue;
            }

            // Rows beyond 255 columns interleave a filler byte at each
            // 255-column boundary.
            if over255 && consumed > 0 && consumed % 255 == 0 && self.r.read_u8()?.is_none() {
                return Ok(false);
            }

            let Some(len_byte) = self.r.read_u8()? else {
                return Ok(false);
            };
            consumed += 1;

            let len = match len_byte {
                EXPDP_COL_NULL => {
                    self.s.record.value_mut(idx).set_null();
                    continue;
                }
                EXPDP_COL_EMPTY => {
                    let ctype = self.s.table.columns[idx].ctype;
                    self.s.record.value_mut(idx).set_text("", ctype);
                    continue;
                }
                EXPDP_COL_LONG_LEN => match self.r.read_u16_le()? {
                    Some(l) => l as usize,
                    None => return Ok(false),
                },
                n => n as usize,
            };

            col_buf.resize(len, 0);
            if !self.r.read_exact(&mut col_buf)? {
                return Ok(false);
            }

            let s = &mut *self.s;
            let col = &s.table.columns[idx];
            let value = s.record.value_mut(idx);
            decode_column(
                col,
                &col_buf,
                s.table.charset,
                s.out_charset,
                s.date_format,
                value,
            );
        }
        Ok(true)
    }

    /// Consume a single length-prefixed LOB chunk. Returns `false` on a
    /// truncated stream.
    fn skip_lob_chunk(&mut self) -> Result<bool> {
        let Some(len_byte) = self.r.read_u8()? else {
            return Ok(false);
        };
        let len = match len_byte {
            EXPDP_COL_NULL | EXPDP_COL_EMPTY => 0,
            EXPDP_COL_LONG_LEN => match self.r.read_u16_le()? {
                Some(l) => l as usize,
                None => return Ok(false),
            },
            n => n as usize,
        };
        self.r.skip(len as u64)?;
        Ok(true)
    }
}

fn lob_placeholder(ctype: ColumnType) -> &'static str {
    match ctype {
        ColumnType::NClob => NCLOB_PLACEHOLDER,
        ColumnType::Bfile => BFILE_PLACEHOLDER,
        ColumnType::Clob => CLOB_PLACEHOLDER,
        _ => BLOB_PLACEHOLDER,
    }
}

// --- DDL unit parsing ---------------------------------------------------

#[derive(Debug, Default)]
struct ColBuilder {
    name: String,
    type_num: u32,
    length: u32,
    precision: u32,
    scale: i32,
    charset_id: u32,
}

impl ColBuilder {
    fn build(self) -> Column {
        let ctype = ColumnType::from_expdp_type_num(self.type_num, self.length);
        let length = if self.length > 0 {
            self.length
        } else {
            ctype.default_length()
        };
        let type_str = render_type_str(ctype, length, self.precision, self.scale);
        Column {
            name: self.name,
            ctype,
            length,
            precision: self.precision,
            scale: self.scale,
            charset_id: self.charset_id,
            type_str,
        }
    }
}

/// Extract one table definition from a DDL unit's XML.
///
/// The DataPump metadata schema nests the owner and table name under
/// `SCHEMA_OBJ` and one `COL_LIST_ITEM` per column. System-generated
/// `SYS_NC…$` columns are dropped along with their slot.
fn parse_ddl_unit(xml: &[u8], header_schema: &str, charset: Charset) -> Option<Table> {
    let mut reader = XmlReader::new(xml);
    let mut table = Table::empty(charset);
    let mut in_schema_obj = false;
    let mut in_col_item = false;
    let mut col = ColBuilder::default();

    while let Some(event) = reader.next_event() {
        match event {
            XmlEvent::Open { name, .. } => match name.as_str() {
                "SCHEMA_OBJ" => in_schema_obj = true,
                "COL_LIST_ITEM" => {
                    in_col_item = true;
                    col = ColBuilder::default();
                }
                _ => {}
            },
            XmlEvent::Close { name, text, .. } => match name.as_str() {
                "SCHEMA_OBJ" => in_schema_obj = false,
                "OWNER_NAME" if in_schema_obj => table.schema = text,
                "NAME" => {
                    if in_col_item {
                        col.name = text;
                    } else if in_schema_obj && table.name.is_empty() {
                        table.name = text;
                    }
                }
                "TYPE_NUM" if in_col_item => col.type_num = parse_num(&text),
                "LENGTH" if in_col_item => col.length = parse_num(&text),
                "PRECISION_NUM" if in_col_item => col.precision = parse_num(&text),
                "SCALE" if in_col_item => col.scale = text.trim().parse().unwrap_or(0),
                "CHARSETID" if in_col_item => col.charset_id = parse_num(&text),
                "COL_LIST_ITEM" => {
                    in_col_item = false;
                    let finished = std::mem::take(&mut col);
                    if !finished.name.is_empty() && !is_system_column(&finished.name) {
                        table.columns.push(finished.build());
                    }
                }
                _ => {}
            },
            XmlEvent::SelfClose { .. } => {}
        }
    }

    if table.name.is_empty() || table.columns.is_empty() {
        return None;
    }
    if table.schema.is_empty() {
        table.schema = header_schema.to_string();
    }
    table.update_lob_count();
    Some(table)
}

fn parse_num(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}

/// `SYS_NC…$` columns are system-generated storage columns.
fn is_system_column(name: &str) -> bool {
    name.starts_with("SYS_NC") && name.ends_with('$')
}

fn render_type_str(ctype: ColumnType, length: u32, precision: u32, scale: i32) -> String {
    match ctype {
        ColumnType::Number => {
            if precision == 0 {
                "NUMBER".to_string()
            } else if scale == 0 {
                format!("NUMBER({})", precision)
            } else {
                format!("NUMBER({},{})", precision, scale)
            }
        }
        ColumnType::Varchar => format!("VARCHAR2({})", length),
        ColumnType::NVarchar => format!("NVARCHAR2({})", length),
        ColumnType::Char => format!("CHAR({})", length),
        ColumnType::NChar => format!("NCHAR({})", length),
        ColumnType::Raw => format!("RAW({})", length),
        ColumnType::Date => "DATE".to_string(),
        ColumnType::Timestamp => "TIMESTAMP".to_string(),
        ColumnType::TimestampTz => "TIMESTAMP WITH TIME ZONE".to_string(),
        ColumnType::TimestampLtz => "TIMESTAMP WITH LOCAL TIME ZONE".to_string(),
        ColumnType::Long => "LONG".to_string(),
        ColumnType::LongRaw => "LONG RAW".to_string(),
        ColumnType::Blob => "BLOB".to_string(),
        ColumnType::Clob => "CLOB".to_string(),
        ColumnType::NClob => "NCLOB".to_string(),
        ColumnType::Bfile => "BFILE".to_string(),
        ColumnType::BinaryFloat => "BINARY_FLOAT".to_string(),
        ColumnType::BinaryDouble => "BINARY_DOUBLE".to_string(),
        ColumnType::Rowid => "ROWID".to_string(),
        _ => format!("VARCHAR2({})", length),
    }
}
