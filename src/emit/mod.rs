//! Dialect-aware DDL/DML generation: the query synthesis half of the
//! engine, driven by the data model (`crate::model`) and the history
//! concatenator (`crate::concatenate`).

pub mod column;
pub mod data;
pub mod table;

use crate::model::Value;

/// Render a scalar as the SQL literal the original always embeds
/// directly (never parameterized, per `spec.md` §9's noted shortcut --
/// this crate's one exception is the config-table version write-back,
/// which the orchestrator parameterizes explicitly).
pub(crate) fn render_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Json(j) => format!("'{}'", render_json_literal(j)),
    }
}

/// Serialize a `serde_json::Value` the way Python's `json.dumps` does by
/// default (`", "` / `": "` separators), since the original emitter's
/// `default_data` rendering goes through exactly that call.
fn render_json_literal(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => format!("\"{}\"", escape_json_string(s)),
        serde_json::Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(render_json_literal).collect();
            format!("[{}]", parts.join(", "))
        }
        serde_json::Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("\"{}\": {}", escape_json_string(k), render_json_literal(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
    }
}

fn escape_json_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_json_object_with_python_style_spacing() {
        let value = serde_json::json!({"json": "t"});
        assert_eq!(render_literal(&Value::Json(value)), "'{\"json\": \"t\"}'");
    }

    #[test]
    fn escapes_single_quotes_in_text() {
        assert_eq!(render_literal(&Value::Text("O'Brien".to_string())), "'O''Brien'");
    }
}
