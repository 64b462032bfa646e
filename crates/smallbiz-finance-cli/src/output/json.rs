use serde_json::Value;

/// Layout of JSON output: indented for terminals, single-line for pipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    Pretty,
    Compact,
}

pub fn render_json(value: &Value, style: JsonStyle) -> Result<String, serde_json::Error> {
    match style {
        JsonStyle::Pretty => serde_json::to_string_pretty(value),
        JsonStyle::Compact => serde_json::to_string(value),
    }
}

pub fn print_json(value: &Value, style: JsonStyle) -> Result<(), serde_json::Error> {
    println!("{}", render_json(value, style)?);
    Ok(())
}
