//! Column definitions and Oracle semantic type classification.

use crate::dump::constants::*;

/// Semantic column type recovered from dump DDL or EXPDP metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    Null,
    Char,
    NChar,
    Varchar,
    NVarchar,
    Number,
    Float,
    Long,
    Raw,
    Date,
    Timestamp,
    TimestampTz,
    TimestampLtz,
    IntervalYm,
    IntervalDs,
    Blob,
    Clob,
    NClob,
    LongRaw,
    BinaryFloat,
    BinaryDouble,
    Bfile,
    XmlType,
    Rowid,
    UserDefined,
}

impl ColumnType {
    /// Classify a DDL type string such as `VARCHAR2(100)` or
    /// `TIMESTAMP(6) WITH TIME ZONE`.
    ///
    /// Matching is by longest applicable keyword prefix, so `LONG RAW`
    /// wins over `LONG` and `NCLOB` over `CLOB`.
    pub fn from_ddl(type_str: &str) -> Self {
        let upper = type_str.to_uppercase();
        let u = upper.as_str();

        if u.starts_with("VARCHAR2") || u.starts_with("VARCHAR") {
            ColumnType::Varchar
        } else if u.starts_with("NVARCHAR2") || u.starts_with("NVARCHAR") {
            ColumnType::NVarchar
        } else if u.starts_with("NCHAR") {
            ColumnType::NChar
        } else if u.starts_with("CHAR") {
            ColumnType::Char
        } else if u.starts_with("NUMBER") {
            ColumnType::Number
        } else if u.starts_with("BINARY_FLOAT") {
            ColumnType::BinaryFloat
        } else if u.starts_with("BINARY_DOUBLE") {
            ColumnType::BinaryDouble
        } else if u.starts_with("FLOAT") {
            ColumnType::Float
        } else if u.starts_with("TIMESTAMP") && u.contains("LOCAL") {
            ColumnType::TimestampLtz
        } else if u.starts_with("TIMESTAMP") && u.contains("TIME ZONE") {
            ColumnType::TimestampTz
        } else if u.starts_with("TIMESTAMP") {
            ColumnType::Timestamp
        } else if u.starts_with("DATE") {
            ColumnType::Date
        } else if u.starts_with("INTERVAL") && u.contains("YEAR") {
            ColumnType::IntervalYm
        } else if u.starts_with("INTERVAL") && u.contains("DAY") {
            ColumnType::IntervalDs
        } else if u.starts_with("LONG RAW") {
            ColumnType::LongRaw
        } else if u.starts_with("LONG") {
            ColumnType::Long
        } else if u.starts_with("RAW") {
            ColumnType::Raw
        } else if u.starts_with("BLOB") {
            ColumnType::Blob
        } else if u.starts_with("NCLOB") {
            ColumnType::NClob
        } else if u.starts_with("CLOB") {
            ColumnType::Clob
        } else if u.starts_with("BFILE") {
            ColumnType::Bfile
        } else if u.starts_with("XMLTYPE") {
            ColumnType::XmlType
        } else if u.starts_with("ROWID") || u.starts_with("UROWID") {
            ColumnType::Rowid
        } else {
            ColumnType::Varchar
        }
    }

    /// Map an EXPDP `TYPE_NUM` integer to a semantic type.
    ///
    /// Type 23 doubles as RAW and BLOB; a declared length means an inline
    /// RAW, no length means out-of-line LOB storage.
    pub fn from_expdp_type_num(num: u32, length: u32) -> Self {
        match num {
            1 => ColumnType::Varchar,
            2 => ColumnType::Number,
            8 => ColumnType::Long,
            12 => ColumnType::Date,
            23 => {
                if length > 0 {
                    ColumnType::Raw
                } else {
                    ColumnType::Blob
                }
            }
            96 => ColumnType::Char,
            112 => ColumnType::Clob,
            113 => ColumnType::Blob,
            180 => ColumnType::Timestamp,
            181 => ColumnType::TimestampTz,
            231 => ColumnType::TimestampLtz,
            _ => ColumnType::Varchar,
        }
    }

    /// LOB-category types get distinct metadata framing in EXP dumps.
    /// LONG and LONG_RAW are stored inline and are deliberately excluded.
    pub fn is_lob_category(self) -> bool {
        matches!(
            self,
            ColumnType::Blob
                | ColumnType::Clob
                | ColumnType::NClob
                | ColumnType::Bfile
                | ColumnType::UserDefined
        )
    }

    /// Fixed-width character types have their trailing pad spaces trimmed.
    pub fn is_fixed_char(self) -> bool {
        matches!(self, ColumnType::Char | ColumnType::NChar)
    }

    /// Default encoded length for types declared without an explicit size.
    pub fn default_length(self) -> u32 {
        match self {
            ColumnType::Date => 7,
            ColumnType::Timestamp | ColumnType::TimestampLtz => 11,
            ColumnType::TimestampTz => 13,
            ColumnType::Rowid => 18,
            ColumnType::BinaryFloat => 4,
            ColumnType::BinaryDouble => 8,
            _ => 0,
        }
    }

    /// Maximum plausible encoded length, used to spot corrupt length
    /// prefixes in EXP record streams. `None` means unbounded.
    pub fn max_encoded_len(self) -> Option<usize> {
        match self {
            ColumnType::Number | ColumnType::Float => Some(MAX_LEN_NUMBER),
            ColumnType::Date => Some(MAX_LEN_DATE),
            ColumnType::Timestamp | ColumnType::TimestampTz | ColumnType::TimestampLtz => {
                Some(MAX_LEN_TIMESTAMP)
            }
            ColumnType::IntervalYm | ColumnType::IntervalDs => Some(MAX_LEN_INTERVAL),
            ColumnType::Bfile => Some(MAX_LEN_BFILE),
            ColumnType::Rowid => Some(MAX_LEN_ROWID),
            ColumnType::Char | ColumnType::NChar | ColumnType::Varchar | ColumnType::NVarchar => {
                Some(MAX_VARCHAR_LEN * 3)
            }
            _ => None,
        }
    }
}

/// One column of a table definition.
#[derive(Debug, Clone, Default)]
pub struct Column {
    /// Column name, in the dump's charset.
    pub name: String,
    /// Semantic type.
    pub ctype: ColumnType,
    /// Declared length.
    pub length: u32,
    /// Declared precision (NUMBER).
    pub precision: u32,
    /// Declared scale (NUMBER); Oracle allows negative scales.
    pub scale: i32,
    /// Charset id for N-types (EXPDP metadata).
    pub charset_id: u32,
    /// Rendered type string, e.g. `"NUMBER(10,2)"`, used for display.
    pub type_str: String,
}

impl Column {
    /// Build a column from a DDL column entry: name plus type string.
    pub fn from_ddl(name: &str, type_str: &str) -> Self {
        let ctype = ColumnType::from_ddl(type_str);
        let (mut length, precision, scale) = parse_type_args(type_str);
        if length == 0 {
            length = ctype.default_length();
        }
        Self {
            name: name.to_string(),
            ctype,
            length,
            precision,
            scale,
            charset_id: 0,
            type_str: type_str.to_string(),
        }
    }
}

/// Extract `(length, precision, scale)` from the parenthesized arguments
/// of a type string. `NUMBER(p,s)` sets precision = length.
fn parse_type_args(type_str: &str) -> (u32, u32, i32) {
    let Some(open) = type_str.find('(') else {
        return (0, 0, 0);
    };
    let args = &type_str[open + 1..];
    let length = leading_int(args).max(0) as u32;

    if let Some(comma) = args.find(',') {
        let scale = leading_int(&args[comma + 1..]);
        (length, length, scale)
    } else {
        (length, 0, 0)
    }
}

fn leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let mut end = 0;
    let bytes = s.as_bytes();
    if end < bytes.len() && bytes[end] == b'-' {
        end += 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    s[..end].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ddl_varchar() {
        let col = Column::from_ddl("NAME", "VARCHAR2(100)");
        assert_eq!(col.ctype, ColumnType::Varchar);
        assert_eq!(col.length, 100);
        assert_eq!(col.type_str, "VARCHAR2(100)");
    }

    #[test]
    fn test_from_ddl_number_precision_scale() {
        let col = Column::from_ddl("AMOUNT", "NUMBER(10,2)");
        assert_eq!(col.ctype, ColumnType::Number);
        assert_eq!(col.precision, 10);
        assert_eq!(col.scale, 2);
    }

    #[test]
    fn test_from_ddl_negative_scale() {
        let col = Column::from_ddl("ROUNDED", "NUMBER(10,-2)");
        assert_eq!(col.scale, -2);
    }

    #[test]
    fn test_longest_prefix_wins() {
        assert_eq!(ColumnType::from_ddl("LONG RAW"), ColumnType::LongRaw);
        assert_eq!(ColumnType::from_ddl("LONG"), ColumnType::Long);
        assert_eq!(ColumnType::from_ddl("NCLOB"), ColumnType::NClob);
        assert_eq!(ColumnType::from_ddl("CLOB"), ColumnType::Clob);
        assert_eq!(
            ColumnType::from_ddl("BINARY_FLOAT"),
            ColumnType::BinaryFloat
        );
        assert_eq!(ColumnType::from_ddl("FLOAT(126)"), ColumnType::Float);
    }

    #[test]
    fn test_timestamp_variants() {
        assert_eq!(
            ColumnType::from_ddl("TIMESTAMP(6)"),
            ColumnType::Timestamp
        );
        assert_eq!(
            ColumnType::from_ddl("TIMESTAMP(6) WITH TIME ZONE"),
            ColumnType::TimestampTz
        );
        assert_eq!(
            ColumnType::from_ddl("TIMESTAMP(6) WITH LOCAL TIME ZONE"),
            ColumnType::TimestampLtz
        );
    }

    #[test]
    fn test_default_lengths() {
        assert_eq!(Column::from_ddl("D", "DATE").length, 7);
        assert_eq!(Column::from_ddl("T", "TIMESTAMP").length, 11);
        assert_eq!(
            Column::from_ddl("T", "TIMESTAMP WITH TIME ZONE").length,
            13
        );
        assert_eq!(Column::from_ddl("R", "ROWID").length, 18);
        assert_eq!(Column::from_ddl("F", "BINARY_FLOAT").length, 4);
        assert_eq!(Column::from_ddl("F", "BINARY_DOUBLE").length, 8);
    }

    #[test]
    fn test_unknown_type_falls_back_to_varchar() {
        assert_eq!(ColumnType::from_ddl("GEOMETRY"), ColumnType::Varchar);
    }

    #[test]
    fn test_lob_category_excludes_long_types() {
        assert!(ColumnType::Blob.is_lob_category());
        assert!(ColumnType::Clob.is_lob_category());
        assert!(ColumnType::Bfile.is_lob_category());
        assert!(ColumnType::UserDefined.is_lob_category());
        assert!(!ColumnType::Long.is_lob_category());
        assert!(!ColumnType::LongRaw.is_lob_category());
    }

    #[test]
    fn test_expdp_type_num_map() {
        assert_eq!(
            ColumnType::from_expdp_type_num(1, 10),
            ColumnType::Varchar
        );
        assert_eq!(ColumnType::from_expdp_type_num(2, 22), ColumnType::Number);
        assert_eq!(ColumnType::from_expdp_type_num(23, 16), ColumnType::Raw);
        assert_eq!(ColumnType::from_expdp_type_num(23, 0), ColumnType::Blob);
        assert_eq!(ColumnType::from_expdp_type_num(113, 0), ColumnType::Blob);
        assert_eq!(
            ColumnType::from_expdp_type_num(231, 11),
            ColumnType::TimestampLtz
        );
        assert_eq!(
            ColumnType::from_expdp_type_num(999, 0),
            ColumnType::Varchar
        );
    }
}
