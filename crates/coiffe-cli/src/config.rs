use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Preview rendering configuration.
///
/// Layered as: built-in defaults, then an optional TOML file, then
/// `COIFFE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Canvas width in display pixels (default: 800).
    pub display_width: u32,
    /// Canvas height in display pixels (default: 600).
    pub display_height: u32,
    /// Physical pixels per display pixel (default: 1.0).
    pub device_pixel_ratio: f64,
    /// Where `preview` writes the exported PNG (default: preview.png).
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_width: 800,
            display_height: 600,
            device_pixel_ratio: 1.0,
            output: PathBuf::from("preview.png"),
        }
    }
}

impl Config {
    /// Load configuration, reading `path` (or `$COIFFE_CONFIG`) as TOML when set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env_var = std::env::var("COIFFE_CONFIG").ok().map(PathBuf::from);
        let base = match path.map(Path::to_path_buf).or(from_env_var) {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                let config = Self::from_toml_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?;
                tracing::debug!(path = %path.display(), "loaded config file");
                config
            }
            None => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `COIFFE_*` overrides from `lookup`; unparsable values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.display_width = env_u32(&lookup, "COIFFE_DISPLAY_WIDTH", self.display_width);
        self.display_height = env_u32(&lookup, "COIFFE_DISPLAY_HEIGHT", self.display_height);
        self.device_pixel_ratio =
            env_f64(&lookup, "COIFFE_DEVICE_PIXEL_RATIO", self.device_pixel_ratio);
        if let Some(output) = lookup("COIFFE_OUTPUT") {
            self.output = PathBuf::from(output);
        }
        self
    }
}

fn env_u32(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> u32 {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
