//! Configuration management.

use crate::gst::overlay::WindowingBackend;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use pipebridge_types::HardwareCodec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = ".pipebridge.toml";
/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "PIPEBRIDGE_";

/// Bridge configuration, matching the TOML file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub media: MediaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    pub log_level: Option<String>,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// GStreamer debug threshold, e.g. `*:2` or `appsrc:5`
    pub gst_debug: Option<String>,
    /// Route GStreamer and GLib output through tracing
    #[serde(default = "default_forward_gst_logs")]
    pub forward_gst_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            log_file: None,
            gst_debug: None,
            forward_gst_logs: default_forward_gst_logs(),
        }
    }
}

fn default_forward_gst_logs() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default)]
    pub windowing: WindowingBackend,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Preferred hardware codec when picking presets
    #[serde(default)]
    pub hardware: HardwareCodec,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub windowing: Option<WindowingBackend>,
    pub hardware: Option<HardwareCodec>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `.pipebridge.toml` in current directory
    /// 2. `config.toml` in user config directory (~/.config/pipebridge/ on Linux)
    ///
    /// Environment variables use `__` between section and key, e.g.
    /// `PIPEBRIDGE_LOGGING__LOG_LEVEL=debug`.
    pub fn from_figment(overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let local_config = std::env::current_dir()
            .ok()
            .map(|d| d.join(LOCAL_CONFIG_FILE));
        let user_config = directories::ProjectDirs::from("", "", "pipebridge")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // defaults < user config < local config < env vars < CLI args
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(ref level) = overrides.log_level {
            figment = figment.merge(Serialized::default("logging.log_level", level));
        }
        if let Some(ref file) = overrides.log_file {
            figment = figment.merge(Serialized::default("logging.log_file", file));
        }
        if let Some(windowing) = overrides.windowing {
            figment = figment.merge(Serialized::default("overlay.windowing", windowing));
        }
        if let Some(hardware) = overrides.hardware {
            figment = figment.merge(Serialized::default("media.hardware", hardware));
        }

        Ok(figment.extract()?)
    }
}
