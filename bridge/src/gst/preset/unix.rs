use super::{PAYLOAD_TYPE_H264, PAYLOAD_TYPE_OPUS};
use pipebridge_types::preset::{CLOCK_RATE_AUDIO, CLOCK_RATE_VIDEO, MIME_TYPE_H264, MIME_TYPE_OPUS};
use pipebridge_types::{CodecKind, HardwareCodec, MediaSource, Preset};

const REMOTE_H264_SW: &str = "appsrc name=src format=time is-live=true do-timestamp=true \
    ! application/x-rtp \
    ! rtph264depay \
    ! queue \
    ! decodebin \
    ! videoconvert \
    ! autovideosink sync=false";

const REMOTE_H264_VAAPI: &str = "appsrc name=src format=time is-live=true do-timestamp=true \
    ! application/x-rtp \
    ! rtph264depay \
    ! h264parse \
    ! vaapih264dec low-latency=true \
    ! queue \
    ! vaapipostproc \
    ! vaapisink sync=false";

pub(super) static PRESETS: &[Preset] = &[
    Preset {
        mime_type: MIME_TYPE_H264,
        kind: CodecKind::Video,
        hardware: HardwareCodec::None,
        source: MediaSource::Camera,
        clock_rate: CLOCK_RATE_VIDEO,
        payload_type: PAYLOAD_TYPE_H264,
        local: "v4l2src \
            ! video/x-raw,width=640,height=360 \
            ! videorate \
            ! video/x-raw,framerate=15/1 \
            ! queue \
            ! videoconvert \
            ! video/x-raw,format=I420 \
            ! aspectratiocrop aspect-ratio=16/10 \
            ! tee name=encode \
                ! queue \
                ! videoflip method=horizontal-flip \
                ! autovideosink \
            encode. \
                ! queue \
                ! x264enc speed-preset=ultrafast tune=zerolatency key-int-max=20 bitrate=500 \
                ! video/x-h264,stream-format=byte-stream,profile=high \
                ! appsink name=sink",
        remote: REMOTE_H264_SW,
    },
    Preset {
        mime_type: MIME_TYPE_H264,
        kind: CodecKind::Video,
        hardware: HardwareCodec::Vaapi,
        source: MediaSource::Camera,
        clock_rate: CLOCK_RATE_VIDEO,
        payload_type: PAYLOAD_TYPE_H264,
        local: "v4l2src \
            ! video/x-raw,width=640,height=360 \
            ! videorate \
            ! video/x-raw,framerate=15/1 \
            ! videoconvert \
            ! video/x-raw,format=I420 \
            ! aspectratiocrop aspect-ratio=16/10 \
            ! tee name=encode \
                ! queue \
                ! videoflip method=horizontal-flip \
                ! vaapipostproc \
                ! vaapisink \
            encode. \
                ! queue \
                ! vaapipostproc \
                ! vaapih264enc \
                ! video/x-h264,stream-format=byte-stream,profile=high \
                ! appsink name=sink",
        remote: REMOTE_H264_VAAPI,
    },
    Preset {
        mime_type: MIME_TYPE_H264,
        kind: CodecKind::Video,
        hardware: HardwareCodec::None,
        source: MediaSource::Screen,
        clock_rate: CLOCK_RATE_VIDEO,
        payload_type: PAYLOAD_TYPE_H264,
        local: "ximagesrc use-damage=false \
            ! video/x-raw,framerate=25/1 \
            ! videoscale \
            ! videoconvert \
            ! queue \
            ! x264enc tune=zerolatency key-int-max=60 speed-preset=ultrafast \
            ! video/x-h264,stream-format=byte-stream,profile=high \
            ! appsink name=sink",
        remote: REMOTE_H264_SW,
    },
    Preset {
        mime_type: MIME_TYPE_H264,
        kind: CodecKind::Video,
        hardware: HardwareCodec::Vaapi,
        source: MediaSource::Screen,
        clock_rate: CLOCK_RATE_VIDEO,
        payload_type: PAYLOAD_TYPE_H264,
        local: "ximagesrc use-damage=false \
            ! video/x-raw,framerate=25/1 \
            ! vaapipostproc \
            ! queue \
            ! vaapih264enc cpb-length=300 quality-level=7 keyframe-period=0 compliance-mode=1 cabac=1 \
            ! video/x-h264,stream-format=byte-stream,profile=high \
            ! appsink name=sink",
        remote: REMOTE_H264_VAAPI,
    },
    Preset {
        mime_type: MIME_TYPE_H264,
        kind: CodecKind::Video,
        hardware: HardwareCodec::Nvcodec,
        source: MediaSource::Screen,
        clock_rate: CLOCK_RATE_VIDEO,
        payload_type: PAYLOAD_TYPE_H264,
        local: "ximagesrc use-damage=false \
            ! video/x-raw,framerate=25/1 \
            ! videoconvert \
            ! queue \
            ! nvh264enc preset=low-latency \
            ! video/x-h264,stream-format=byte-stream,profile=high \
            ! appsink name=sink",
        remote: "appsrc name=src format=time is-live=true do-timestamp=true \
            ! application/x-rtp \
            ! rtph264depay \
            ! decodebin \
            ! glimagesink sync=false",
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
            ! queue \
            ! autoaudiosink",
    },
];
