use serde_json::Value;

/// Headline fields, most specific first. Dotted keys reach into nested objects.
const PRIORITY_KEYS: &[&str] = &[
    "npv",
    "irr",
    "wacc",
    "payback_period",
    "recommendation",
    "expected_return",
    "monthly_payment",
    "final_balance",
    "months_required",
    "most_sensitive",
    "breakeven_value",
    "summary.mean",
];

/// Print just the headline answer from the output envelope.
pub fn print_minimal(value: &Value) {
    println!("{}", headline(value));
}

fn headline(value: &Value) -> String {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result else {
        return format_minimal(result);
    };

    for key in PRIORITY_KEYS {
        if let Some(val) = lookup(result, key) {
            if !val.is_null() {
                return format_minimal(val);
            }
        }
    }

    // Nothing recognised: show the first field with its name.
    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn lookup<'a>(value: &'a Value, dotted: &str) -> Option<&'a Value> {
    dotted
        .split('.')
        .try_fold(value, |current, segment| current.get(segment))
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
