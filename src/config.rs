//! The engine's own bookkeeping table: one row per managed database,
//! tracking the stored version and template lock.

use crate::dialect::Dialect;
use crate::driver::{Driver, Row};
use crate::error::AlphaDbError;
use crate::model::Value;

/// The config table's canonical name.
pub const CONFIG_TABLE: &str = "adb_conf";

/// The legacy name some existing deployments still use.
pub const CONFIG_TABLE_LEGACY: &str = "fdb_cfg";

/// `(db, version, template)` read from (or written to) the config table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRow {
    pub db: String,
    pub version: String,
    pub template: Option<String>,
}

/// Which config table name to address. `update`/`status`/etc. accept
/// this so a caller working against a pre-existing `fdb_cfg` deployment
/// does not have to rename it before adopting this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompatibilityMode {
    /// Use `adb_conf`.
    Current,
    /// Use the legacy `fdb_cfg` name.
    Legacy,
}

impl CompatibilityMode {
    pub fn table_name(self) -> &'static str {
        match self {
            CompatibilityMode::Current => CONFIG_TABLE,
            CompatibilityMode::Legacy => CONFIG_TABLE_LEGACY,
        }
    }
}

fn row_text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Text(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other_to_string(other)),
    }
}

fn other_to_string(value: &Value) -> String {
    match value {
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Text(s) => s.clone(),
        Value::Json(j) => j.to_string(),
        Value::Null => String::new(),
    }
}

/// Read the config row for `db_name`, if the table and row both exist.
///
/// A missing table is treated the same as a missing row (the **absent**
/// orchestrator state): a query against an unknown table is expected to
/// fail at the driver level, and that failure is swallowed here rather
/// than surfaced, since this function's only job is "is there a row".
pub fn read_config(
    driver: &mut dyn Driver,
    mode: CompatibilityMode,
    dialect: Dialect,
    db_name: &str,
) -> Result<Option<ConfigRow>, AlphaDbError> {
    let table = mode.table_name();
    let sql = format!(
        "SELECT db, version, template FROM {table} WHERE db = {};",
        dialect.placeholder(1)
    );
    let row = match driver.fetch_one(&sql, &[Value::Text(db_name.to_string())]) {
        Ok(row) => row,
        Err(_) => return Ok(None),
    };

    let Some(row) = row else {
        return Ok(None);
    };

    let version = row_text(&row, "version").ok_or(AlphaDbError::DbConfigIncomplete { missing: "version" })?;
    let template = row_text(&row, "template");

    Ok(Some(ConfigRow {
        db: db_name.to_string(),
        version,
        template,
    }))
}

/// DDL to create the config table, per dialect.
pub fn create_table_sql(mode: CompatibilityMode, dialect: Dialect) -> String {
    let table = mode.table_name();
    match dialect {
        Dialect::MySQL => format!(
            "CREATE TABLE IF NOT EXISTS {table} ( db VARCHAR(100) PRIMARY KEY, version VARCHAR(50) NOT NULL, \
             template VARCHAR(50) NULL ) ENGINE = InnoDB;"
        ),
        Dialect::SQLite | Dialect::PostgreSQL => format!(
            "CREATE TABLE IF NOT EXISTS {table} ( db VARCHAR(100) PRIMARY KEY, version VARCHAR(50) NOT NULL, \
             template VARCHAR(50) NULL );"
        ),
    }
}

/// `INSERT` seeding the row `init` writes on first creation:
/// `(db_name, "0.0.0", null)`.
pub fn insert_initial_row_sql(mode: CompatibilityMode, dialect: Dialect, db_name: &str) -> (String, Vec<Value>) {
    let table = mode.table_name();
    let placeholders = (1..=3).map(|i| dialect.placeholder(i)).collect::<Vec<_>>().join(", ");
    (
        format!("INSERT INTO {table} (db, version, template) VALUES ({placeholders});"),
        vec![Value::Text(db_name.to_string()), Value::Text("0.0.0".to_string()), Value::Null],
    )
}

/// `UPDATE` writing back the advanced version.
pub fn update_version_sql(mode: CompatibilityMode, dialect: Dialect, db_name: &str, version: &str) -> (String, Vec<Value>) {
    let table = mode.table_name();
    (
        format!(
            "UPDATE {table} SET version = {} WHERE db = {};",
            dialect.placeholder(1),
            dialect.placeholder(2)
        ),
        vec![Value::Text(version.to_string()), Value::Text(db_name.to_string())],
    )
}

/// `UPDATE` locking the template name in on the first `update` call.
pub fn update_template_sql(mode: CompatibilityMode, dialect: Dialect, db_name: &str, template: &str) -> (String, Vec<Value>) {
    let table = mode.table_name();
    (
        format!(
            "UPDATE {table} SET template = {} WHERE db = {};",
            dialect.placeholder(1),
            dialect.placeholder(2)
        ),
        vec![Value::Text(template.to_string()), Value::Text(db_name.to_string())],
    )
}
