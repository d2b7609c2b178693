//! Decoders for Oracle's fixed-layout binary value encodings.
//!
//! These are pure functions from raw dump bytes to display strings; the
//! parsers dispatch into them per column type.

pub mod binary;
pub mod datetime;
pub mod number;

pub use binary::{decode_binary_double, decode_binary_float};
pub use datetime::{decode_date, decode_timestamp, DateFormat};
pub use number::decode_number;
