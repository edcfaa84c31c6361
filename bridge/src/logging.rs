//! Tracing setup and the GStreamer/GLib log bridge.

use crate::config::LoggingConfig;
use anyhow::{anyhow, Context};
use gstreamer as gst;
use gstreamer::glib;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber.
///
/// The configured level wins over `RUST_LOG`; without either, `info` is
/// used. When a log file is configured the returned guard must be kept
/// alive for buffered lines to be flushed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = match &config.log_level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{}'", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stdout_layer = fmt::layer().with_target(false).compact();

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let (dir, file_name) = split_log_path(path)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::never(&dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

fn split_log_path(path: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log file path '{}' has no file name", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(file_name)))
}

/// Redirection of GStreamer's debug log and GLib's print output into
/// tracing.
///
/// Owned by the bridge context; dropping it restores GLib's print handler
/// and detaches the GStreamer log function.
pub struct GstLogBridge {
    log_function: Option<gst::log::DebugLogFunction>,
    print_handler: bool,
}

impl GstLogBridge {
    /// Apply the configured GStreamer threshold and, if enabled, install
    /// the redirection. GStreamer must already be initialized.
    pub fn install(config: &LoggingConfig) -> Self {
        if let Some(threshold) = &config.gst_debug {
            gst::log::set_threshold_from_string(threshold, true);
            debug!("GStreamer debug threshold set to '{}'", threshold);
        }

        if !config.forward_gst_logs {
            return Self {
                log_function: None,
                print_handler: false,
            };
        }

        gst::log::remove_default_log_function();
        let log_function = gst::log::add_log_function(
            |category, level, file, _function, line, _object, message| {
                let Some(message) = message.get() else {
                    return;
                };
                forward(category.name(), level, file.as_str(), line, message.as_str());
            },
        );
        glib::set_print_handler(|text| info!(target: "glib", "{}", text.trim_end()));
        glib::set_printerr_handler(|text| warn!(target: "glib", "{}", text.trim_end()));

        debug!("GStreamer and GLib output redirected to tracing");
        Self {
            log_function: Some(log_function),
            print_handler: true,
        }
    }

    pub fn is_forwarding(&self) -> bool {
        self.log_function.is_some()
    }
}

impl Drop for GstLogBridge {
    fn drop(&mut self) {
        if let Some(log_function) = self.log_function.take() {
            gst::log::remove_log_function(log_function);
        }
        if self.print_handler {
            glib::unset_print_handler();
            glib::unset_printerr_handler();
        }
    }
}

fn forward(category: &str, level: gst::DebugLevel, file: &str, line: u32, message: &str) {
    match level {
        gst::DebugLevel::Error => error!(target: "gstreamer", "{} {}:{} {}", category, file, line, message),
        gst::DebugLevel::Warning | gst::DebugLevel::Fixme => {
            warn!(target: "gstreamer", "{} {}:{} {}", category, file, line, message)
        }
        gst::DebugLevel::Info => info!(target: "gstreamer", "{} {}:{} {}", category, file, line, message),
        gst::DebugLevel::Debug => debug!(target: "gstreamer", "{} {}:{} {}", category, file, line, message),
        _ => trace!(target: "gstreamer", "{} {}:{} {}", category, file, line, message),
    }
}
