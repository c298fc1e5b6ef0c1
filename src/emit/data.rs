//! The default-data emitter: renders `INSERT` statements from the
//! declarative row objects attached to a version entry.

use crate::model::Row;

use super::render_literal;

/// Render one `INSERT INTO table (...) VALUES (...);` statement for
/// `row`. Columns whose value is `null` are omitted entirely, matching
/// the original (`examples/original_source/src/py/utils/query/default_data.py`).
pub fn insert_row(table: &str, row: &Row) -> String {
    let mut columns = Vec::with_capacity(row.0.len());
    let mut values = Vec::with_capacity(row.0.len());

    for (key, value) in &row.0 {
        if value.is_null() {
            continue;
        }
        columns.push(key.as_str());
        values.push(render_literal(value));
    }

    format!(
        "INSERT INTO {table} ({}) VALUES ({});",
        columns.join(","),
        values.join(",")
    )
}

/// Render one `INSERT` statement per row in `rows`, in declaration order.
pub fn insert_rows(table: &str, rows: &[Row]) -> Vec<String> {
    rows.iter().map(|row| insert_row(table, row)).collect()
}
