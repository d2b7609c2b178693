//! Character-set bridge between the dump's encoding and the output encoding.
//!
//! Dumps record their source encoding either as a header byte (EXP) or as an
//! NLS charset name such as `AL32UTF8` (EXPDP). Conversion goes through
//! UTF-8 as the pivot; `encoding_rs` handles everything except UTF-16
//! output, which it does not encode.

use crate::error::Result;
use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};

/// Named character sets a dump can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    ShiftJis,
    EucJp,
    Utf16Le,
    Utf16Be,
    UsAscii,
    Latin1,
}

impl Charset {
    /// Map an NLS charset name (e.g. `JA16SJIS`) to a charset.
    ///
    /// Matching is by substring, mirroring how loosely the names appear in
    /// dump headers across Oracle versions. Unrecognized names fall back to
    /// UTF-8.
    pub fn from_nls_name(name: &str) -> Self {
        if name.contains("UTF8") || name.contains("AL32UTF8") {
            Charset::Utf8
        } else if name.contains("JA16SJIS") || name.contains("SJIS") {
            Charset::ShiftJis
        } else if name.contains("JA16EUC") || name.contains("EUC") {
            Charset::EucJp
        } else if name.contains("AL16UTF16") {
            Charset::Utf16Le
        } else if name.contains("US7ASCII") {
            Charset::UsAscii
        } else if name.starts_with("WE8") {
            Charset::Latin1
        } else {
            Charset::Utf8
        }
    }

    /// Map the charset indicator byte found in EXP headers.
    pub fn from_exp_header_byte(b: u8) -> Self {
        match b {
            0x30..=0x3F => Charset::EucJp,
            0x40..=0x4F => Charset::ShiftJis,
            0x60..=0x6F => Charset::Utf8,
            0xD0..=0xDF => Charset::Utf16Le,
            _ => Charset::Latin1,
        }
    }

    fn encoding(self) -> &'static Encoding {
        match self {
            Charset::Utf8 => UTF_8,
            Charset::ShiftJis => SHIFT_JIS,
            Charset::EucJp => EUC_JP,
            Charset::Utf16Le => UTF_16LE,
            Charset::Utf16Be => UTF_16BE,
            // encoding_rs has no pure-ASCII encoding; windows-1252 is a
            // strict superset and round-trips all ASCII bytes.
            Charset::UsAscii => WINDOWS_1252,
            Charset::Latin1 => WINDOWS_1252,
        }
    }
}

/// Convert a byte run from one charset to another.
///
/// Same-charset conversions are a plain copy. Undecodable sequences are
/// replaced rather than failing: the output is for display, and dumps with
/// mixed or mislabeled encodings are common.
pub fn convert(bytes: &[u8], from: Charset, to: Charset) -> Result<Vec<u8>> {
    if from == to {
        return Ok(bytes.to_vec());
    }

    let (text, _, _) = from.encoding().decode(bytes);
    Ok(encode_to(&text, to))
}

/// Decode a byte run in the given charset to a `String` (UTF-8).
pub fn decode_to_string(bytes: &[u8], from: Charset) -> String {
    let (text, _, _) = from.encoding().decode(bytes);
    text.into_owned()
}

fn encode_to(text: &str, to: Charset) -> Vec<u8> {
    match to {
        Charset::Utf8 => text.as_bytes().to_vec(),
        Charset::Utf16Le => text
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect(),
        Charset::Utf16Be => text
            .encode_utf16()
            .flat_map(|u| u.to_be_bytes())
            .collect(),
        Charset::UsAscii => text
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect(),
        _ => {
            let (out, _, _) = to.encoding().encode(text);
            out.into_owned()
        }
    }
}
