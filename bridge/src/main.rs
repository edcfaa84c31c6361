//! pipebridge command line.

use anyhow::Context;
use clap::{Parser, Subcommand};
use pipebridge::config::{Config, ConfigOverrides};
use pipebridge::gst::preset::{find_preset, presets, presets_by_source};
use pipebridge::types::{BridgeEvent, HardwareCodec, MediaSource, PipelineId, Preset};
use pipebridge::{logging, BridgeContext, ChannelObserver, WindowingBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// pipebridge - run GStreamer pipelines through the host bridge
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (overrides config file and RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    /// Windowing backend used to resolve display surfaces
    #[arg(long, value_parser = parse_windowing)]
    windowing: Option<WindowingBackend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a pipeline description and print its events
    Run {
        /// Pipeline description, e.g. "videotestsrc num-buffers=10 ! appsink name=sink"
        description: String,

        /// Pipeline id reported in events
        #[arg(long, default_value_t = 1)]
        id: PipelineId,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,

        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// List the presets available on this platform
    Presets {
        /// Only show presets for this source (screen, camera, voice)
        #[arg(long, value_parser = parse_source)]
        source: Option<MediaSource>,
    },
    /// Print the description of one preset
    Preset {
        #[arg(value_parser = parse_source)]
        source: MediaSource,

        /// MIME type, e.g. video/h264
        mime_type: String,

        /// Hardware codec (vaapi, nvcodec, vdpau, osxvt); software if omitted
        #[arg(long)]
        hardware: Option<String>,

        /// Print the receive/decode description instead of capture/encode
        #[arg(long)]
        remote: bool,
    },
}

fn parse_windowing(s: &str) -> Result<WindowingBackend, String> {
    s.parse()
}

fn parse_source(s: &str) -> Result<MediaSource, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_figment(&ConfigOverrides {
        log_level: args.log_level.clone(),
        windowing: args.windowing,
        ..Default::default()
    })
    .context("failed to load configuration")?;

    let _log_guard = logging::init(&config.logging)?;

    match args.command {
        Command::Run {
            description,
            id,
            json,
            seconds,
        } => run(&config, &description, id, json, seconds).await,
        Command::Presets { source } => {
            let list: Vec<&Preset> = match source {
                Some(source) => presets_by_source(source),
                None => presets().iter().collect(),
            };
            if list.is_empty() {
                println!("No presets available on this platform");
            }
            for preset in list {
                println!(
                    "{:<8} {:<12} {:<8} clock={} pt={}",
                    preset.source.as_str(),
                    preset.mime_type,
                    preset.hardware.as_str(),
                    preset.clock_rate,
                    preset.payload_type
                );
            }
            Ok(())
        }
        Command::Preset {
            source,
            mime_type,
            hardware,
            remote,
        } => {
            let hardware = hardware
                .map(|name| HardwareCodec::from_name(&name))
                .unwrap_or(config.media.hardware);
            let preset = find_preset(source, &mime_type, hardware)?;
            if remote {
                println!("{}", preset.remote);
            } else {
                println!("{}", preset.local);
            }
            Ok(())
        }
    }
}

async fn run(
    config: &Config,
    description: &str,
    id: PipelineId,
    json: bool,
    seconds: Option<u64>,
) -> anyhow::Result<()> {
    let context = BridgeContext::new(config)?;
    let (observer, mut events) = ChannelObserver::new();
    let handle = context.create_pipeline_with_observer(description, id, Arc::new(observer))?;
    handle.start()?;
    info!("Pipeline {} started", id);

    let timeout = async {
        match seconds {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(timeout);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut samples = 0usize;
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                if matches!(event, BridgeEvent::Sample(_)) {
                    samples += 1;
                }
                print_event(&event, json)?;
                if event.is_terminal() {
                    break;
                }
            }
            _ = &mut timeout => {
                info!("Time limit reached");
                break;
            }
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                }
                info!("Interrupted");
                break;
            }
        }
    }

    info!("Pipeline {} delivered {} sample(s)", id, samples);
    context.destroy(id)?;
    context.shutdown();
    Ok(())
}

fn print_event(event: &BridgeEvent, json: bool) -> anyhow::Result<()> {
    if !json {
        println!("{}", event.description());
        return Ok(());
    }

    let line = match event {
        // Payload bytes are summarized.
        BridgeEvent::Sample(sample) => serde_json::to_string(&serde_json::json!({
            "type": "Sample",
            "data": {
                "pipeline_id": sample.pipeline_id,
                "size": sample.len(),
                "duration_ns": sample.duration_or_sentinel(),
                "pts_ns": sample.pts_ns,
            }
        }))?,
        other => serde_json::to_string(other)?,
    };
    println!("{}", line);
    Ok(())
}
