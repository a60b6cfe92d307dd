use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an optional JSON config file.
pub const CONFIG_ENV: &str = "IV_GRAPHER_CONFIG";

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// User-tunable settings; every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Pre-filled device area in µm² (the area field starts disabled if absent).
    pub default_area_um2: Option<f64>,
    /// PNG export geometry.
    pub render: RenderConfig,
    /// File name suggested by the export dialog.
    pub archive_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_area_um2: None,
            render: RenderConfig::default(),
            archive_name: "iv_jv_graphs.zip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Blank border around the plot area, in pixels.
    pub margin: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            margin: 50,
        }
    }
}

/// Largest accepted image side, in pixels.
pub const MAX_IMAGE_SIDE: u32 = 8192;
/// Room the chart needs inside the margins for caption, tick labels and axis titles.
const MIN_CHART_SIDE: u32 = 160;

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width > MAX_IMAGE_SIDE || self.height > MAX_IMAGE_SIDE {
            anyhow::bail!(
                "render size {}x{} exceeds the {MAX_IMAGE_SIDE}px limit",
                self.width,
                self.height
            );
        }
        let needed = self
            .margin
            .checked_mul(2)
            .and_then(|m| m.checked_add(MIN_CHART_SIDE))
            .with_context(|| format!("render margin {} is out of range", self.margin))?;
        if self.width < needed || self.height < needed {
            anyhow::bail!(
                "render margin {} leaves no room in a {}x{} image",
                self.margin,
                self.width,
                self.height
            );
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load from `$IV_GRAPHER_CONFIG` if set, otherwise defaults.
    ///
    /// A broken config file is logged and ignored.
    pub fn load() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::from_path(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded config from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("parsing config JSON")?;
        config.render.validate()?;
        Ok(config)
    }
}
