//! Dump format constants.
//!
//! These constants are derived from observed EXP / EXPDP dump files; the
//! formats themselves are undocumented.

// EXP header
pub const EXP_HEADER_SIZE: u64 = 0x100;
pub const EXP_SIGNATURE: &[u8] = b"EXPORT:";

// EXP record stream markers (u16 little-endian length prefixes)
pub const EXP_LEN_ROW_END: u16 = 0x0000;
pub const EXP_LEN_TABLE_END: u16 = 0xFFFF;
pub const EXP_LEN_NULL: u16 = 0xFFFE;
pub const EXP_LEN_ESCAPE: u16 = 0xFF00;

// EXP metadata: Oracle internal type codes that carry 4 charset bytes
pub const EXP_META_CHAR_TYPES: &[u8] = &[0x01, 0x40, 0x60, 0x70, 0xD0];
// XMLTYPE columns abort metadata parsing for the table
pub const EXP_META_TYPE_XMLTYPE: u8 = 0x3A;

// EXPDP record header bytes
pub const EXPDP_REC_END_00: u8 = 0x00;
pub const EXPDP_REC_END_FF: u8 = 0xFF;
pub const EXPDP_REC_NORMAL_01: u8 = 0x01;
pub const EXPDP_REC_NORMAL_04: u8 = 0x04;
pub const EXPDP_REC_LOB_08: u8 = 0x08;
pub const EXPDP_REC_LOB_09: u8 = 0x09;
pub const EXPDP_REC_SINGLE_LOB: u8 = 0x0C;
pub const EXPDP_REC_OVER255: &[u8] = &[0x18, 0x19, 0x1C, 0x2C, 0x3C];

// EXPDP column length bytes
pub const EXPDP_COL_EMPTY: u8 = 0x00;
pub const EXPDP_COL_NULL: u8 = 0xFF;
pub const EXPDP_COL_LONG_LEN: u8 = 0xFE;

// EXPDP markers
pub const EXPDP_XML_START: &[u8] = b"<?xml";
pub const EXPDP_XML_DECL: &[u8] = b"xml version";
pub const EXPDP_DDL_END: &[u8] = b"</ROWSET>";
pub const EXPDP_KGC_MARKER: &[u8] = b"KGC";
pub const EXPDP_HDR_MARKER: &[u8] = b"HDR";

// Detection header offsets
pub const DETECT_MIN_HEADER_LEN: usize = 1280;
pub const DETECT_SCHEMA_OFFSET: usize = 0x43;
pub const DETECT_CHARSET_OFFSET: usize = 0x127;
pub const DETECT_CHARSET_OFFSET_ALT: usize = 0x2A2;
pub const DETECT_SCAN_LIMIT: u64 = 1024 * 1024;

// Block and buffer sizing
pub const DUMP_BLOCK_LEN: usize = 4096;
pub const FILE_BUF_LEN: usize = 65536;
pub const DDL_BUF_LEN: usize = 256 * 1024;

// Structural limits
pub const MAX_COLUMNS: usize = 1000;
pub const MAX_VARCHAR_LEN: usize = 98301; // UTF-8 max VARCHAR2
pub const MAX_RECORD_LEN: usize = 6_144_000;

// Per-type maximum encoded lengths for corruption checks
pub const MAX_LEN_NUMBER: usize = 32;
pub const MAX_LEN_DATE: usize = 7;
pub const MAX_LEN_TIMESTAMP: usize = 13;
pub const MAX_LEN_INTERVAL: usize = 11;
pub const MAX_LEN_BFILE: usize = 1000;
pub const MAX_LEN_ROWID: usize = 100;

// Columns that mark Oracle's internal DataPump dictionary table
pub const DICTIONARY_SIGNATURE: &[&str] = &[
    "SCN",
    "SEED",
    "OPERATION",
    "BASE_OBJECT_NAME",
    "BASE_OBJECT_SCHEMA",
    "COMPLETED_ROWS",
    "PROCESS_ORDER",
];
pub const DICTIONARY_MATCH_MIN: usize = 5;
