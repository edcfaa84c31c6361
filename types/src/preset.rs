//! Media preset descriptors.
//!
//! A preset pairs a local capture/encode pipeline description with the
//! matching remote receive/decode description for one source, codec and
//! hardware acceleration combination.

use serde::{Deserialize, Serialize};

pub const MIME_TYPE_VP8: &str = "video/vp8";
pub const MIME_TYPE_H264: &str = "video/h264";
pub const MIME_TYPE_OPUS: &str = "audio/opus";

/// RTP clock rate used by video codecs.
pub const CLOCK_RATE_VIDEO: u32 = 90_000;
/// RTP clock rate used by audio codecs.
pub const CLOCK_RATE_AUDIO: u32 = 48_000;

/// Where the media of a preset comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    Screen,
    Camera,
    Voice,
}

impl MediaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Camera => "camera",
            Self::Voice => "voice",
        }
    }
}

impl std::fmt::Display for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "screen" => Ok(Self::Screen),
            "camera" => Ok(Self::Camera),
            "voice" => Ok(Self::Voice),
            other => Err(format!("unknown media source: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    Video,
    Audio,
}

/// Hardware acceleration used by a preset's encoder/decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HardwareCodec {
    /// Software codecs only
    #[default]
    None,
    Auto,
    Vaapi,
    Nvcodec,
    Vdpau,
    #[serde(rename = "osxvt")]
    OsxVt,
}

impl HardwareCodec {
    /// Parse a hardware codec name, case-insensitively.
    ///
    /// Unknown names fall back to software (`None`).
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "auto" => Self::Auto,
            "vaapi" => Self::Vaapi,
            "nvcodec" => Self::Nvcodec,
            "vdpau" => Self::Vdpau,
            "osxvt" => Self::OsxVt,
            _ => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Auto => "auto",
            Self::Vaapi => "vaapi",
            Self::Nvcodec => "nvcodec",
            Self::Vdpau => "vdpau",
            Self::OsxVt => "osxvt",
        }
    }
}

impl std::fmt::Display for HardwareCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform pipeline preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preset {
    pub mime_type: &'static str,
    pub kind: CodecKind,
    pub hardware: HardwareCodec,
    pub source: MediaSource,
    pub clock_rate: u32,
    pub payload_type: u8,
    /// Capture/encode description; emits samples from `appsink name=sink`
    pub local: &'static str,
    /// Receive/decode description; accepts buffers on `appsrc name=src`
    pub remote: &'static str,
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.mime_type, self.hardware, self.source)
    }
}
