use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format the output envelope as tables.
///
/// Scalars and nested objects share one Field/Value table (nested keys are
/// dotted). Arrays of objects, such as an amortization schedule, get their
/// own table below it.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => print_result_tables(result, map),
            None => println!("{}", field_table(map)),
        },
        Value::Array(arr) => println!("{}", row_table(arr)),
        _ => println!("{}", value),
    }
}

fn print_result_tables(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => {
            let mut scalars = Map::new();
            let mut sections: Vec<(&str, &[Value])> = Vec::new();
            for (key, val) in res_map {
                match val {
                    Value::Array(rows) if rows.iter().all(Value::is_object) && !rows.is_empty() => {
                        sections.push((key.as_str(), rows.as_slice()));
                    }
                    _ => flatten_into(&mut scalars, key, val),
                }
            }
            println!("{}", field_table(&scalars));
            for (name, rows) in sections {
                println!("\n{}:", name);
                println!("{}", row_table(rows));
            }
        }
        other => println!("{}", format_value(other)),
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn flatten_into(out: &mut Map<String, Value>, prefix: &str, value: &Value) {
    match value {
        Value::Object(inner) => {
            for (key, val) in inner {
                flatten_into(out, &format!("{}.{}", prefix, key), val);
            }
        }
        _ => {
            out.insert(prefix.to_string(), value.clone());
        }
    }
}

fn field_table(map: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    builder.build()
}

fn row_table(rows: &[Value]) -> Table {
    let mut builder = Builder::default();
    let headers: Vec<String> = match rows.first() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => vec!["value".to_string()],
    };
    builder.push_record(headers.clone());
    for item in rows {
        let row: Vec<String> = match item {
            Value::Object(map) => headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect(),
            other => vec![format_value(other)],
        };
        builder.push_record(row);
    }
    builder.build()
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_objects_flatten_with_dots() {
        let mut out = Map::new();
        flatten_into(
            &mut out,
            "summary",
            &json!({"mean": 1.5, "percentiles": {"p5": -2.0}}),
        );
        assert_eq!(out.get("summary.mean"), Some(&json!(1.5)));
        assert_eq!(out.get("summary.percentiles.p5"), Some(&json!(-2.0)));
    }

    #[test]
    fn test_row_table_uses_first_object_headers() {
        let rows = vec![
            json!({"period": 1, "payment": "8884.88"}),
            json!({"period": 2, "payment": "8884.88"}),
        ];
        let rendered = row_table(&rows).to_string();
        assert!(rendered.contains("period"));
        assert!(rendered.contains("8884.88"));
    }
}
