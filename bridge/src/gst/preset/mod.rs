//! Platform pipeline presets.
//!
//! Each platform ships a table of capture/encode ("local") descriptions
//! ending in the emission endpoint, paired with receive/decode ("remote")
//! descriptions starting at the injection endpoint.

#[cfg(target_os = "macos")]
mod macos;
#[cfg(any(
    target_os = "linux",
    target_os = "dragonfly",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
mod unix;

use pipebridge_types::{HardwareCodec, MediaSource, Preset};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PresetError {
    #[error("preset {mime_type} {hardware} ({media_source}) not found")]
    NotFound {
        media_source: MediaSource,
        mime_type: String,
        hardware: HardwareCodec,
    },
}

/// RTP payload type negotiated for H.264.
pub(crate) const PAYLOAD_TYPE_H264: u8 = 102;
/// RTP payload type negotiated for Opus.
pub(crate) const PAYLOAD_TYPE_OPUS: u8 = 111;

/// Presets available on this platform.
pub fn presets() -> &'static [Preset] {
    #[cfg(target_os = "macos")]
    {
        macos::PRESETS
    }
    #[cfg(any(
        target_os = "linux",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    ))]
    {
        unix::PRESETS
    }
    #[cfg(not(any(
        target_os = "macos",
        target_os = "linux",
        target_os = "dragonfly",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd"
    )))]
    {
        &[]
    }
}

/// Find the preset for an exact source, MIME type and hardware match.
pub fn find_preset(
    source: MediaSource,
    mime_type: &str,
    hardware: HardwareCodec,
) -> Result<&'static Preset, PresetError> {
    presets()
        .iter()
        .find(|p| p.source == source && p.mime_type == mime_type && p.hardware == hardware)
        .ok_or_else(|| PresetError::NotFound {
            media_source: source,
            mime_type: mime_type.to_string(),
            hardware,
        })
}

pub fn presets_by_source(source: MediaSource) -> Vec<&'static Preset> {
    presets().iter().filter(|p| p.source == source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipebridge_types::preset::{MIME_TYPE_H264, MIME_TYPE_OPUS, MIME_TYPE_VP8};

    #[test]
    fn test_missing_preset_names_all_keys() {
        let err = find_preset(MediaSource::Screen, MIME_TYPE_VP8, HardwareCodec::Vdpau)
            .unwrap_err();
        assert_eq!(err.to_string(), "preset video/vp8 vdpau (screen) not found");

        assert!(find_preset(MediaSource::Screen, "", HardwareCodec::None).is_err());
    }

    #[test]
    fn test_endpoints_are_named() {
        for preset in presets() {
            assert!(
                preset.local.trim_end().ends_with("appsink name=sink"),
                "{} local graph must end in the emission endpoint",
                preset
            );
            assert!(
                preset
                    .remote
                    .trim_start()
                    .starts_with("appsrc name=src format=time is-live=true do-timestamp=true"),
                "{} remote graph must start at the injection endpoint",
                preset
            );
        }
    }

    #[test]
    fn test_presets_by_source_filters() {
        for source in [MediaSource::Screen, MediaSource::Camera, MediaSource::Voice] {
            assert!(presets_by_source(source)
                .iter()
                .all(|preset| preset.source == source));
        }
    }

    #[cfg(any(target_os = "linux", target_os = "macos"))]
    #[test]
    fn test_software_presets_exist() {
        let screen = find_preset(MediaSource::Screen, MIME_TYPE_H264, HardwareCodec::None).unwrap();
        assert_eq!(screen.clock_rate, pipebridge_types::preset::CLOCK_RATE_VIDEO);
        assert_eq!(screen.payload_type, PAYLOAD_TYPE_H264);

        let voice = find_preset(MediaSource::Voice, MIME_TYPE_OPUS, HardwareCodec::None).unwrap();
        assert_eq!(voice.clock_rate, pipebridge_types::preset::CLOCK_RATE_AUDIO);
        assert_eq!(voice.payload_type, PAYLOAD_TYPE_OPUS);
    }
}
