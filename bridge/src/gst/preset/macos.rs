use super::{PAYLOAD_TYPE_H264, PAYLOAD_TYPE_OPUS};
use pipebridge_types::preset::{CLOCK_RATE_AUDIO, CLOCK_RATE_VIDEO, MIME_TYPE_H264, MIME_TYPE_OPUS};
use pipebridge_types::{CodecKind, HardwareCodec, MediaSource, Preset};

pub(super) static PRESETS: &[Preset] = &[
    Preset {
        mime_type: MIME_TYPE_H264,
        kind: CodecKind::Video,
        hardware: HardwareCodec::None,
        source: MediaSource::Screen,
        clock_rate: CLOCK_RATE_VIDEO,
        payload_type: PAYLOAD_TYPE_H264,
        local: "avfvideosrc capture-screen=true \
            ! video/x-raw,framerate=25/1 \
            ! videoscale \
            ! videoconvert \
            ! queue \
            ! x264enc tune=zerolatency key-int-max=60 speed-preset=ultrafast \
            ! video/x-h264,stream-format=byte-stream,profile=high \
            ! appsink name=sink",
        remote: "appsrc name=src format=time is-live=true do-timestamp=true \
            ! application/x-rtp \
            ! rtph264depay \
            ! queue \
            ! decodebin \
            ! videoconvert \
            ! autovideosink sync=false",
    },
    Preset {
        mime_type: MIME_TYPE_H264,
        kind: CodecKind::Video,
        hardware: HardwareCodec::OsxVt,
        source: MediaSource::Screen,
        clock_rate: CLOCK_RATE_VIDEO,
        payload_type: PAYLOAD_TYPE_H264,
        local: "avfvideosrc capture-screen=true \
            ! video/x-raw,framerate=25/1 \
            ! videoscale \
            ! videoconvert \
            ! queue \
            ! vtenc_h264 \
            ! video/x-h264,stream-format=byte-stream,profile=high \
            ! appsink name=sink",
        remote: "appsrc name=src format=time is-live=true do-timestamp=true \
            ! application/x-rtp \
            ! rtph264depay \
            ! queue \
            ! vtdec_h264 \
            ! videoconvert \
            ! autovideosink sync=false",
    },
    Preset {
        mime_type: MIME_TYPE_OPUS,
        kind: CodecKind::Audio,
        hardware: HardwareCodec::None,
        source: MediaSource::Voice,
        clock_rate: CLOCK_RATE_AUDIO,
        payload_type: PAYLOAD_TYPE_OPUS,
        local: "autoaudiosrc ! opusenc ! appsink name=sink",
        remote: "appsrc name=src format=time is-live=true do-timestamp=true \
            ! application/x-rtp, payload=96, encoding-name=OPUS \
            ! rtpopusdepay \
            ! decodebin \
            ! autoaudiosink",
    },
];
