use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    #[serde(default)]
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "Strata".to_string(), width: 1600, height: 900, vsync: true, fullscreen: false }
    }
}

/// Dump-space geometry; matches the capture device the archives come from.
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "LayoutConfig::default_screen_width")]
    pub screen_width: f32,
    #[serde(default = "LayoutConfig::default_screen_height")]
    pub screen_height: f32,
    #[serde(default = "LayoutConfig::default_box_depth")]
    pub box_depth: f32,
    #[serde(default = "LayoutConfig::default_depth_step")]
    pub depth_step: f32,
    #[serde(default = "LayoutConfig::default_fit_padding")]
    pub fit_padding: f32,
}

impl LayoutConfig {
    const fn default_screen_width() -> f32 {
        1080.0
    }

    const fn default_screen_height() -> f32 {
        2400.0
    }

    const fn default_box_depth() -> f32 {
        20.0
    }

    const fn default_depth_step() -> f32 {
        10.0
    }

    const fn default_fit_padding() -> f32 {
        1.2
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            screen_width: Self::default_screen_width(),
            screen_height: Self::default_screen_height(),
            box_depth: Self::default_box_depth(),
            depth_step: Self::default_depth_step(),
            fit_padding: Self::default_fit_padding(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
}

impl CameraConfig {
    const fn default_fov_degrees() -> f32 {
        75.0
    }

    const fn default_near() -> f32 {
        0.1
    }

    const fn default_far() -> f32 {
        50_000.0
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: Self::default_fov_degrees(),
            near: Self::default_near(),
            far: Self::default_far(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "PathsConfig::default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "PathsConfig::default_export_dir")]
    pub export_dir: PathBuf,
}

impl PathsConfig {
    fn default_state_dir() -> PathBuf {
        PathBuf::from("state")
    }

    fn default_export_dir() -> PathBuf {
        PathBuf::from("export")
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { state_dir: Self::default_state_dir(), export_dir: Self::default_export_dir() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vsync: Option<bool>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(vsync) = overrides.vsync {
            self.window.vsync = vsync;
        }
    }
}
