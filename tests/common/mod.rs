//! Shared helpers for integration tests.

use oracle_dump_rs::{DumpSink, RowEvent, TableEvent};

/// A table event captured for assertions.
#[derive(Debug, Clone)]
pub struct SeenTable {
    pub schema: String,
    pub name: String,
    pub col_names: Vec<String>,
    pub col_types: Vec<String>,
    pub row_count: u64,
    pub ddl_offset: u64,
}

/// Sink that records every event it receives.
#[derive(Debug, Default)]
pub struct CollectSink {
    pub tables: Vec<SeenTable>,
    /// (table name, values) per row; `None` marks a null column.
    pub rows: Vec<(String, Vec<Option<String>>)>,
    pub progress: Vec<i32>,
}

impl DumpSink for CollectSink {
    fn on_table(&mut self, event: &TableEvent<'_>) {
        self.tables.push(SeenTable {
            schema: event.schema.to_string(),
            name: event.table.to_string(),
            col_names: event.col_names.to_vec(),
            col_types: event.col_types.to_vec(),
            row_count: event.row_count,
            ddl_offset: event.ddl_offset,
        });
    }

    fn on_row(&mut self, event: &RowEvent<'_>) {
        let values = event
            .values
            .iter()
            .map(|v| {
                if v.is_null() {
                    None
                } else {
                    Some(v.as_str().into_owned())
                }
            })
            .collect();
        self.rows.push((event.table.to_string(), values));
    }

    fn on_progress(&mut self, _rows: u64, _table: &str, pct: i32) {
        self.progress.push(pct);
    }
}

impl CollectSink {
    pub fn table(&self, name: &str) -> Option<&SeenTable> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn rows_of(&self, name: &str) -> Vec<&Vec<Option<String>>> {
        self.rows
            .iter()
            .filter(|(t, _)| t == name)
            .map(|(_, v)| v)
            .collect()
    }
}
