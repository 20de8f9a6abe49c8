use crate::layout::RotationMode;
use crate::model::CanvasSize;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// "Boe ne k" read as big-endian bytes.
pub const DEFAULT_SEED: u64 = 0x426f_6520_6e65_206b;

/// Per-pass cloud settings, as edited by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudSettings {
    pub rotation: RotationMode,
    pub normalize_font: bool,
    pub use_impact_font: bool,
    pub random_placement: bool,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            rotation: RotationMode::None,
            normalize_font: true,
            use_impact_font: false,
            random_placement: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// A pass running longer than this shows the busy indicator.
    pub busy_threshold_ms: u64,
    /// Work done per tick before control returns to the host.
    pub time_slice_ms: u64,
    pub seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            busy_threshold_ms: 500,
            time_slice_ms: 16,
            seed: DEFAULT_SEED,
        }
    }
}

impl PipelineConfig {
    pub fn busy_threshold(&self) -> Duration {
        Duration::from_millis(self.busy_threshold_ms)
    }

    pub fn time_slice(&self) -> Duration {
        Duration::from_millis(self.time_slice_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl RenderConfig {
    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub theme: Theme,
    pub cloud: CloudSettings,
    pub pipeline: PipelineConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    cloud: Option<CloudFile>,
    pipeline: Option<PipelineFile>,
    width: Option<f64>,
    height: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    background: Option<String>,
    text_color: Option<String>,
    halo_light: Option<String>,
    halo_dark: Option<String>,
    selection_fill: Option<String>,
    selection_border: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloudFile {
    rotation: Option<RotationMode>,
    normalize_font: Option<bool>,
    use_impact_font: Option<bool>,
    random_placement: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineFile {
    busy_threshold_ms: Option<u64>,
    time_slice_ms: Option<u64>,
    seed: Option<u64>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Applies a JSON config file on top of the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = serde_json::from_str(contents)?;

    if let Some(name) = parsed.theme.as_deref() {
        config.theme =
            Theme::by_name(name).ok_or_else(|| anyhow::anyhow!("Unknown theme '{name}'"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.halo_light {
            config.theme.halo_light = v;
        }
        if let Some(v) = vars.halo_dark {
            config.theme.halo_dark = v;
        }
        if let Some(v) = vars.selection_fill {
            config.theme.selection_fill = v;
        }
        if let Some(v) = vars.selection_border {
            config.theme.selection_border = v;
        }
    }

    if let Some(cloud) = parsed.cloud {
        if let Some(v) = cloud.rotation {
            config.cloud.rotation = v;
        }
        if let Some(v) = cloud.normalize_font {
            config.cloud.normalize_font = v;
        }
        if let Some(v) = cloud.use_impact_font {
            config.cloud.use_impact_font = v;
        }
        if let Some(v) = cloud.random_placement {
            config.cloud.random_placement = v;
        }
    }

    if let Some(pipeline) = parsed.pipeline {
        if let Some(v) = pipeline.busy_threshold_ms {
            config.pipeline.busy_threshold_ms = v;
        }
        if let Some(v) = pipeline.time_slice_ms {
            config.pipeline.time_slice_ms = v;
        }
        if let Some(v) = pipeline.seed {
            config.pipeline.seed = v;
        }
    }

    if let Some(v) = parsed.width {
        config.render.width = v;
    }
    if let Some(v) = parsed.height {
        config.render.height = v;
    }

    Ok(config)
}
