use std::path::Path;

use smallbiz_finance_core::EngineConfig;

use super::file;

/// Load the engine configuration named by `--config`, or the defaults.
///
/// Files ending in `.yaml` / `.yml` are read as YAML, anything else as JSON.
pub fn load_engine_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let resolved = file::resolve_path(path)?;
    let text = file::read_text(&resolved)?;
    let config = parse_config(&resolved, &text)
        .map_err(|e| format!("Invalid config '{}': {}", resolved.display(), e))?;
    config.validate()?;
    tracing::debug!(path = %resolved.display(), "loaded engine config");
    Ok(config)
}

fn parse_config(path: &Path, text: &str) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    if is_yaml {
        Ok(serde_yaml::from_str(text)?)
    } else {
        Ok(EngineConfig::from_json(text)?)
    }
}
