// config.rs — viewer settings: `skybox_creator.json` plus command-line overrides

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::mesh::Subdivision;
use crate::viewer::{Orientation, SkyboxViewer, DEFAULT_FOV};

pub const CONFIG_FILE_NAME: &str = "skybox_creator.json";
pub const LANG_ENV: &str = "SKYBOX_LANG";
pub const DEFAULT_LOG_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub subdivision: u32,
    pub sensitivity: f32,
    pub fov_deg: f32,
    pub initial_pitch: f32,
    pub initial_yaw: f32,
    /// Folder new skyboxes are exported into. Working directory when unset.
    pub output_dir: Option<PathBuf>,
    pub lang: String,
    pub log_level: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            subdivision: Subdivision::DEFAULT.get(),
            sensitivity: 1.0,
            fov_deg: DEFAULT_FOV,
            initial_pitch: Orientation::INITIAL.pitch,
            initial_yaw: Orientation::INITIAL.yaw,
            output_dir: None,
            lang: "en".to_string(),
            log_level: None,
        }
    }
}

/// Skybox creator command-line arguments. Values override the config file.
#[derive(Parser, Debug, Default)]
#[command(name = "skybox-creator", about = "Build and preview Roblox skyboxes")]
pub struct CliArgs {
    /// Path to a config file (defaults to skybox_creator.json next to the executable).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// UI language code (en, ...).
    #[arg(long)]
    pub lang: Option<String>,

    /// Grid resolution of the spherical preview.
    #[arg(long)]
    pub subdivision: Option<u32>,

    /// Folder exported skyboxes are written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Log filter (error, warn, info, debug, trace or an env_logger spec).
    #[arg(long)]
    pub log_level: Option<String>,
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config the CLI points at, or the first one found by
    /// [`find_config_file`], or defaults.
    pub fn resolve(args: &CliArgs) -> Result<Self, ConfigError> {
        let mut config = match args.config.clone().or_else(find_config_file) {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };

        if args.lang.is_none() {
            if let Ok(lang) = std::env::var(LANG_ENV) {
                if !lang.trim().is_empty() {
                    config.lang = lang;
                }
            }
        }
        config.apply_cli_overrides(args);
        Ok(config)
    }

    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref lang) = args.lang {
            self.lang = lang.clone();
        }
        if let Some(n) = args.subdivision {
            self.subdivision = n;
        }
        if let Some(ref dir) = args.output_dir {
            self.output_dir = Some(dir.clone());
        }
        if let Some(ref level) = args.log_level {
            self.log_level = Some(level.clone());
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log_level
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn output_root(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn build_viewer(&self) -> SkyboxViewer {
        let mut viewer =
            SkyboxViewer::with_orientation(Orientation::new(self.initial_pitch, self.initial_yaw));
        viewer.subdivision = Subdivision::new(self.subdivision);
        viewer.sensitivity = if self.sensitivity.is_finite() && self.sensitivity > 0.0 {
            self.sensitivity
        } else {
            1.0
        };
        viewer.fov = self.fov_deg.clamp(10.0, 120.0);
        viewer
    }
}

/// Searches `<exe_dir>/skybox_creator.json`, then `./skybox_creator.json`.
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join(CONFIG_FILE_NAME);
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from(CONFIG_FILE_NAME);
    if p.exists() {
        return Some(p);
    }

    None
}
