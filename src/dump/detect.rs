//! Dump file format detection.
//!
//! Classifies a file as legacy EXP, DataPump (EXPDP) or block-compressed
//! EXPDP from its header bytes, and guesses the dump's character set from
//! the header's charset indicator (EXP) or NLS charset name (EXPDP).

use std::path::Path;

use log::debug;

use crate::dump::charset::Charset;
use crate::dump::constants::*;
use crate::dump::io::{find_bytes, DumpReader};
use crate::error::{Error, Result};

/// Dump file format classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpKind {
    /// Legacy conventional-path export.
    Exp,
    /// Legacy direct-path export (recognized during EXP header parsing).
    ExpDirect,
    /// DataPump export.
    Expdp,
    /// Block-compressed DataPump export.
    ExpdpCompressed,
}

/// Outcome of format detection.
#[derive(Debug, Clone)]
pub struct Detection {
    pub kind: DumpKind,
    pub charset: Charset,
    /// Schema name recorded in EXPDP headers, when present.
    pub schema: Option<String>,
}

/// Sniff a dump file's format.
///
/// Reads the first block, checks the EXP signature, and otherwise scans
/// forward in 4 KiB blocks (capped at 1 MiB) for the EXPDP markers.
pub fn detect(path: &Path) -> Result<Detection> {
    let mut reader = DumpReader::open(path)?;

    let mut header = vec![0u8; DUMP_BLOCK_LEN];
    let n = read_up_to(&mut reader, &mut header)?;
    if n < DETECT_MIN_HEADER_LEN {
        return Err(Error::format(format!("File too small: {} bytes", n)));
    }
    let header = &header[..n];

    // EXP: version byte plus "EXPORT:" near the start.
    if (0x01..=0x05).contains(&header[0])
        && find_bytes(&header[..n.min(0x20)], EXP_SIGNATURE).is_some()
    {
        let charset = Charset::from_exp_header_byte(header[0x05]);
        debug!("detected EXP dump, charset {:?}", charset);
        return Ok(Detection {
            kind: DumpKind::Exp,
            charset,
            schema: None,
        });
    }

    // EXPDP headers carry a schema name and an NLS charset name as
    // terminated strings at fixed offsets (with an alternate charset
    // offset in newer versions).
    let schema = extract_string(header, DETECT_SCHEMA_OFFSET, 0x200);
    let mut charset_name = extract_string(header, DETECT_CHARSET_OFFSET, 0x200);
    if charset_name.is_empty() {
        charset_name = extract_string(header, DETECT_CHARSET_OFFSET_ALT, n.min(0x400));
    }

    let mut found_xml = find_bytes(header, EXPDP_XML_DECL).is_some();
    let mut found_kgc = find_bytes(header, EXPDP_KGC_MARKER).is_some();
    let mut found_hdr = find_bytes(header, EXPDP_HDR_MARKER).is_some();

    if !found_xml && !found_kgc {
        let mut block = vec![0u8; DUMP_BLOCK_LEN];
        let mut pos = DUMP_BLOCK_LEN as u64;
        while pos < reader.len() && pos < DETECT_SCAN_LIMIT {
            reader.seek_to(pos)?;
            let n = read_up_to(&mut reader, &mut block)?;
            if n == 0 {
                break;
            }
            let b = &block[..n];
            found_xml = found_xml || find_bytes(b, EXPDP_XML_DECL).is_some();
            found_kgc = found_kgc || find_bytes(b, EXPDP_KGC_MARKER).is_some();
            found_hdr = found_hdr || find_bytes(b, EXPDP_HDR_MARKER).is_some();
            if found_xml || (found_kgc && found_hdr) {
                break;
            }
            pos += DUMP_BLOCK_LEN as u64;
        }
    }

    if found_kgc && found_hdr {
        let charset = Charset::from_nls_name(&charset_name);
        debug!("detected compressed EXPDP dump, charset {:?}", charset);
        return Ok(Detection {
            kind: DumpKind::ExpdpCompressed,
            charset,
            schema: non_empty(schema),
        });
    }

    if found_xml {
        let charset = Charset::from_nls_name(&charset_name);
        debug!("detected EXPDP dump, charset {:?}", charset);
        return Ok(Detection {
            kind: DumpKind::Expdp,
            charset,
            schema: non_empty(schema),
        });
    }

    Err(Error::format("Unrecognized dump format"))
}

fn read_up_to(reader: &mut DumpReader, buf: &mut [u8]) -> Result<usize> {
    let avail = (reader.len() - reader.position()).min(buf.len() as u64) as usize;
    if avail == 0 {
        return Ok(0);
    }
    if reader.read_exact(&mut buf[..avail])? {
        Ok(avail)
    } else {
        Ok(0)
    }
}

/// Extract a string terminated by NUL or newline from a header byte range.
fn extract_string(buf: &[u8], start: usize, end: usize) -> String {
    if start >= buf.len() {
        return String::new();
    }
    let end = end.min(buf.len());
    let mut out = Vec::new();
    for &b in &buf[start..end] {
        if b == 0 || b == b'\n' {
            break;
        }
        out.push(b);
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
