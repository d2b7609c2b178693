//! End-to-end tests for the DataPump (EXPDP) format.

mod common;

use common::CollectSink;
use oracle_dump_rs::{DumpKind, Error, Session};
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER_LEN: usize = 0x600;

/// Builder for synthetic EXPDP dump files: zeroed header with schema and
/// NLS charset strings at their fixed offsets, then DDL units each
/// followed by binary records.
struct ExpdpDump {
    data: Vec<u8>,
}

impl ExpdpDump {
    fn new(schema: &str, nls_charset: &str) -> Self {
        let mut data = vec![0u8; HEADER_LEN];
        data[0x43..0x43 + schema.len()].copy_from_slice(schema.as_bytes());
        data[0x127..0x127 + nls_charset.len()].copy_from_slice(nls_charset.as_bytes());
        Self { data }
    }

    fn ddl_unit(&mut self, xml: &str) -> u64 {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(xml.as_bytes());
        offset
    }

    fn row_header(&mut self, header: u8) {
        self.data.push(header);
    }

    fn column(&mut self, bytes: &[u8]) {
        assert!(bytes.len() <= 253);
        self.data.push(bytes.len() as u8);
        self.data.extend_from_slice(bytes);
    }

    fn long_column(&mut self, bytes: &[u8]) {
        self.data.push(0xFE);
        self.data
            .extend_from_slice(&(bytes.len() as u16).to_le_bytes());
        self.data.extend_from_slice(bytes);
    }

    fn null_column(&mut self) {
        self.data.push(0xFF);
    }

    fn empty_column(&mut self) {
        self.data.push(0x00);
    }

    fn end_table(&mut self) {
        self.data.push(0x00);
    }

    fn write(&self, dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, &self.data).unwrap();
        path
    }
}

fn table_xml(owner: &str, name: &str, cols: &[(&str, u32, u32)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?><ROWSET><ROW><TABLE_T>");
    xml.push_str(&format!(
        "<SCHEMA_OBJ><OWNER_NAME>{}</OWNER_NAME><NAME>{}</NAME></SCHEMA_OBJ>",
        owner, name
    ));
    xml.push_str("<COL_LIST>");
    for (col_name, type_num, length) in cols {
        xml.push_str(&format!(
            "<COL_LIST_ITEM><NAME>{}</NAME><TYPE_NUM>{}</TYPE_NUM><LENGTH>{}</LENGTH></COL_LIST_ITEM>",
            col_name, type_num, length
        ));
    }
    xml.push_str("</COL_LIST></TABLE_T></ROW></ROWSET>");
    xml
}

/// EMP(EMPNO NUMBER, ENAME VARCHAR2, HIREDATE DATE) with two rows.
fn emp_dump() -> ExpdpDump {
    let mut d = ExpdpDump::new("SCOTT", "AL32UTF8");
    d.ddl_unit(&table_xml(
        "SCOTT",
        "EMP",
        &[("EMPNO", 2, 22), ("ENAME", 1, 10), ("HIREDATE", 12, 7)],
    ));
    d.row_header(0x01);
    d.column(&[0xC1, 0x02]); // 1
    d.column(b"hello");
    d.null_column();
    d.row_header(0x04);
    d.column(&[0xC1, 0x0B]); // 10
    d.empty_column();
    d.column(&[0x78, 0x77, 0x01, 0x0F, 0x0D, 0x1F, 0x3C]); // 2019/01/15 12:30:59
    d.end_table();
    d
}

#[test]
fn test_detect_expdp() {
    let dir = TempDir::new().unwrap();
    let path = emp_dump().write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    assert_eq!(session.detect().unwrap(), DumpKind::Expdp);
}

#[test]
fn test_full_parse_rows() {
    let dir = TempDir::new().unwrap();
    let path = emp_dump().write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    let mut sink = CollectSink::default();
    session.parse(&mut sink).unwrap();

    let emp = sink.table("EMP").unwrap();
    assert_eq!(emp.schema, "SCOTT");
    assert_eq!(emp.col_names, vec!["EMPNO", "ENAME", "HIREDATE"]);
    assert_eq!(emp.row_count, 2);

    let rows = sink.rows_of("EMP");
    assert_eq!(
        rows[0],
        &vec![Some("1".to_string()), Some("hello".to_string()), None]
    );
    assert_eq!(
        rows[1],
        &vec![
            Some("10".to_string()),
            Some("".to_string()), // 0x00 length byte: empty string, not null
            Some("2019/01/15 12:30:59".to_string()),
        ]
    );
}

#[test]
fn test_listing_skips_records() {
    let dir = TempDir::new().unwrap();
    let path = emp_dump().write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    let mut sink = CollectSink::default();
    session.list_tables(&mut sink).unwrap();

    assert_eq!(sink.tables.len(), 1);
    assert_eq!(sink.tables[0].row_count, 0);
    assert!(sink.rows.is_empty());
}

#[test]
fn test_ddl_offset_reported() {
    let dir = TempDir::new().unwrap();
    let mut d = ExpdpDump::new("SCOTT", "AL32UTF8");
    let offset = d.ddl_unit(&table_xml("SCOTT", "T1", &[("A", 2, 22)]));
    d.end_table();
    let path = d.write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    let mut sink = CollectSink::default();
    session.list_tables(&mut sink).unwrap();
    assert_eq!(sink.tables[0].ddl_offset, offset);
}

#[test]
fn test_long_length_and_two_tables() {
    let dir = TempDir::new().unwrap();
    let mut d = ExpdpDump::new("SCOTT", "AL32UTF8");
    d.ddl_unit(&table_xml("SCOTT", "BIG", &[("TXT", 1, 2000)]));
    let long_text = "x".repeat(300);
    d.row_header(0x01);
    d.long_column(long_text.as_bytes());
    d.end_table();

    d.ddl_unit(&table_xml("SCOTT", "SMALL", &[("N", 2, 22)]));
    d.row_header(0x01);
    d.column(&[0xC1, 0x03]); // 2
    d.end_table();
    let path = d.write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    let mut sink = CollectSink::default();
    session.parse(&mut sink).unwrap();

    assert_eq!(sink.tables.len(), 2);
    assert_eq!(
        sink.rows_of("BIG")[0],
        &vec![Some(long_text)]
    );
    assert_eq!(sink.rows_of("SMALL")[0], &vec![Some("2".to_string())]);
}

#[test]
fn test_fast_seek_with_filter() {
    let dir = TempDir::new().unwrap();
    let mut d = ExpdpDump::new("SCOTT", "AL32UTF8");
    d.ddl_unit(&table_xml("SCOTT", "FIRST", &[("N", 2, 22)]));
    d.row_header(0x01);
    d.column(&[0xC1, 0x02]);
    d.end_table();
    let second_offset = d.ddl_unit(&table_xml("SCOTT", "SECOND", &[("N", 2, 22)]));
    d.row_header(0x01);
    d.column(&[0xC1, 0x04]); // 3
    d.end_table();
    let path = d.write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    session.set_table_filter(None, "SECOND").unwrap();
    session.set_seek_offset(second_offset);
    let mut sink = CollectSink::default();
    session.parse(&mut sink).unwrap();

    assert_eq!(sink.tables.len(), 1);
    assert_eq!(sink.tables[0].name, "SECOND");
    assert_eq!(sink.rows_of("SECOND")[0], &vec![Some("3".to_string())]);
}

#[test]
fn test_dictionary_table_skipped_silently() {
    let dir = TempDir::new().unwrap();
    let mut d = ExpdpDump::new("SYS", "AL32UTF8");
    d.ddl_unit(&table_xml(
        "SYS",
        "SYS_EXPORT_SCHEMA_01",
        &[
            ("PROCESS_ORDER", 2, 22),
            ("SCN", 2, 22),
            ("SEED", 2, 22),
            ("OPERATION", 1, 30),
            ("BASE_OBJECT_NAME", 1, 30),
            ("COMPLETED_ROWS", 2, 22),
        ],
    ));
    // Its records are scanned over while looking for the next DDL unit.
    d.row_header(0x01);
    for _ in 0..5 {
        d.null_column();
    }
    d.column(&[0xC1, 0x02]);
    d.end_table();

    d.ddl_unit(&table_xml("SCOTT", "REAL", &[("N", 2, 22)]));
    d.row_header(0x01);
    d.column(&[0xC1, 0x02]);
    d.end_table();
    let path = d.write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    let mut sink = CollectSink::default();
    session.parse(&mut sink).unwrap();

    assert_eq!(sink.tables.len(), 1);
    assert_eq!(sink.tables[0].name, "REAL");
    assert_eq!(sink.rows.len(), 1);
}

#[test]
fn test_filter_selects_one_table() {
    let dir = TempDir::new().unwrap();
    let mut d = ExpdpDump::new("SCOTT", "AL32UTF8");
    d.ddl_unit(&table_xml("SCOTT", "ONE", &[("N", 2, 22)]));
    d.row_header(0x01);
    d.column(&[0xC1, 0x02]);
    d.end_table();
    d.ddl_unit(&table_xml("SCOTT", "TWO", &[("N", 2, 22)]));
    d.row_header(0x01);
    d.column(&[0xC1, 0x03]);
    d.end_table();
    let path = d.write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    session.set_table_filter(Some("SCOTT"), "TWO").unwrap();
    let mut sink = CollectSink::default();
    session.parse(&mut sink).unwrap();

    assert_eq!(sink.tables.len(), 1);
    assert_eq!(sink.tables[0].name, "TWO");
    assert_eq!(sink.rows_of("TWO")[0], &vec![Some("2".to_string())]);
}

#[test]
fn test_system_columns_dropped() {
    let dir = TempDir::new().unwrap();
    let mut d = ExpdpDump::new("SCOTT", "AL32UTF8");
    d.ddl_unit(&table_xml(
        "SCOTT",
        "T",
        &[("A", 2, 22), ("SYS_NC00002$", 23, 16), ("B", 1, 10)],
    ));
    d.row_header(0x01);
    d.column(&[0xC1, 0x02]);
    d.column(b"bee");
    d.end_table();
    let path = d.write(&dir, "dp.dmp");

    let mut session = Session::new(&path).unwrap();
    let mut sink = CollectSink::default();
    session.parse(&mut sink).unwrap();

    let t = sink.table("T").unwrap();
    assert_eq!(t.col_names, vec!["A", "B"]);
    assert_eq!(
        sink.rows_of("T")[0],
        &vec![Some("1".to_string()), Some("bee".to_string())]
    );
}

#[test]
fn test_compressed_dump_detects_but_does_not_parse() {
    let dir = TempDir::new().unwrap();
    let mut data = vec![0u8; 0x600];
    data[0x127..0x12F].copy_from_slice(b"AL32UTF8");
    data.extend_from_slice(b"KGC\x00\x01HDR\x00\x02");
    let path = dir.path().join("z.dmp");
    std::fs::write(&path, &data).unwrap();

    let mut session = Session::new(&path).unwrap();
    assert_eq!(session.detect().unwrap(), DumpKind::ExpdpCompressed);

    let mut sink = CollectSink::default();
    let result = session.parse(&mut sink);
    assert!(matches!(result, Err(Error::Unsupported { .. })));
    assert!(session.last_error().unwrap().contains("Unsupported"));
}
