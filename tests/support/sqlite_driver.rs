//! A `rusqlite`-backed [`alphadb::Driver`], used only to exercise generated
//! SQL against a real engine (P1). Not part of the crate itself -- a
//! concrete driver is explicitly out of scope per `spec.md` §1.

use alphadb::{Driver, DriverError, Row};
use alphadb::model::Value;
use rusqlite::Connection;
use rusqlite::types::{Value as SqlValue, ValueRef};

pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub fn open_in_memory() -> Self {
        SqliteDriver {
            conn: Connection::open_in_memory().expect("open in-memory sqlite"),
        }
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Json(j) => SqlValue::Text(j.to_string()),
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
    }
}

fn to_driver_error(err: rusqlite::Error) -> DriverError {
    DriverError::new(err.to_string())
}

impl Driver for SqliteDriver {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        let values: Vec<SqlValue> = params.iter().map(to_sql_value).collect();
        let params_ref: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();
        self.conn
            .execute(sql, params_ref.as_slice())
            .map(|n| n as u64)
            .map_err(to_driver_error)
    }

    fn fetch_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Row>, DriverError> {
        let rows = self.fetch_all(sql, params)?;
        Ok(rows.into_iter().next())
    }

    fn fetch_all(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        let values: Vec<SqlValue> = params.iter().map(to_sql_value).collect();
        let params_ref: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

        let mut stmt = self.conn.prepare(sql).map_err(to_driver_error)?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

        let rows = stmt
            .query_map(params_ref.as_slice(), |row| {
                let mut entries = Vec::with_capacity(column_names.len());
                for (idx, name) in column_names.iter().enumerate() {
                    let value = from_value_ref(row.get_ref(idx)?);
                    entries.push((name.clone(), value));
                }
                Ok(Row(entries))
            })
            .map_err(to_driver_error)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(to_driver_error)?);
        }
        Ok(out)
    }
}
