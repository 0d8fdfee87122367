use std::path::Path;

use anyhow::{bail, Context};
use tracing::debug;

use super::types::CorsConfig;

/// Configuration file formats understood by [`load_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Some(ConfigFormat::Yaml),
            Some("toml") => Some(ConfigFormat::Toml),
            Some("json") => Some(ConfigFormat::Json),
            _ => None,
        }
    }
}

/// Parse a configuration document.
pub fn parse_config(content: &str, format: ConfigFormat) -> anyhow::Result<CorsConfig> {
    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).context("invalid YAML configuration")?,
        ConfigFormat::Toml => toml::from_str(content).context("invalid TOML configuration")?,
        ConfigFormat::Json => serde_json::from_str(content).context("invalid JSON configuration")?,
    };
    Ok(config)
}

/// Load the global CORS block and route definitions from a file.
///
/// Only parses; call [`crate::cors::CorsRouteTable::from_config`] to merge and
/// validate before serving traffic.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<CorsConfig> {
    let path = path.as_ref();
    let Some(format) = ConfigFormat::from_path(path) else {
        bail!(
            "unsupported configuration file '{}': expected .yaml, .yml, .toml or .json",
            path.display()
        );
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file '{}'", path.display()))?;
    let config = parse_config(&content, format)
        .with_context(|| format!("failed to parse configuration file '{}'", path.display()))?;
    debug!(
        path = %path.display(),
        format = ?format,
        routes = config.routes.len(),
        all_routes = config.cors.all_routes,
        "Loaded CORS configuration"
    );
    Ok(config)
}
