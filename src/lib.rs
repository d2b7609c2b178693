//! Oracle Dump Parser for Rust
//!
//! A pure Rust decoder for Oracle database export dump files — both the
//! legacy EXP format and DataPump (EXPDP) — that recovers table
//! definitions and row data as a stream of typed events, without a
//! database connection.
//!
//! # Example
//!
//! ```no_run
//! use oracle_dump_rs::{DumpSink, Result, RowEvent, Session, TableEvent};
//!
//! struct Printer;
//!
//! impl DumpSink for Printer {
//!     fn on_table(&mut self, event: &TableEvent<'_>) {
//!         println!("table {}.{}", event.schema, event.table);
//!     }
//!     fn on_row(&mut self, event: &RowEvent<'_>) {
//!         let row: Vec<_> = event.values.iter().map(|v| v.as_str()).collect();
//!         println!("{:?}", row);
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut session = Session::new("export.dmp")?;
//!     session.detect()?;
//!     session.parse(&mut Printer)?;
//!     Ok(())
//! }
//! ```

pub mod dump;
pub mod error;
pub mod export;
pub mod session;

// Re-export main types
pub use dump::{Charset, Column, ColumnType, DateFormat, DumpKind, Table, TableEntry, Value};
pub use error::{Error, Result};
pub use export::{CsvExporter, SqlDialect, SqlExporter};
pub use session::{CancelToken, DumpSink, RowEvent, Session, TableEvent};
