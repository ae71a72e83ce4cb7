//! Media probing through `ffprobe`.
//!
//! Runs `ffprobe -v error -print_format json -show_format -show_streams` once
//! per file and maps the first video and first audio stream into
//! [`MediaProperties`].

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use reelcut_common::error::{ReelcutError, ReelcutResult};
use reelcut_cut_model::{MediaProperties, TimeValue};

/// Probe `path` with the given ffprobe binary.
pub fn probe_media(ffprobe: &str, path: &Path) -> ReelcutResult<MediaProperties> {
    if !path.exists() {
        return Err(ReelcutError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| ReelcutError::probe(format!("Failed to start {ffprobe}: {e}")))?;

    if !output.status.success() {
        return Err(ReelcutError::probe(format!(
            "{ffprobe} failed on {} (status {}): {}",
            path.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let json = String::from_utf8_lossy(&output.stdout);
    let media = parse_probe_output(&json)?;

    tracing::info!(
        path = %path.display(),
        duration = %media.duration,
        resolution = %media.resolution(),
        frame_rate = %media.frame_rate,
        video_codec = %media.video_codec,
        audio_codec = %media.audio_codec,
        "Probed media"
    );
    Ok(media)
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    pix_fmt: Option<String>,
    sample_rate: Option<String>,
    channels: Option<u32>,
    channel_layout: Option<String>,
    duration: Option<String>,
}

/// Map ffprobe's JSON report into media properties.
///
/// Requires at least one video and one audio stream. The duration is the
/// audio stream's duration floored to whole seconds, falling back to the
/// container duration when the stream does not report one.
pub fn parse_probe_output(json: &str) -> ReelcutResult<MediaProperties> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| ReelcutError::probe(format!("ffprobe JSON parse error: {e}")))?;

    let stream_index = |kind: &str| {
        output
            .streams
            .iter()
            .position(|s| s.codec_type.as_deref() == Some(kind))
    };
    let video_index =
        stream_index("video").ok_or_else(|| ReelcutError::probe("no video stream found"))?;
    let audio_index =
        stream_index("audio").ok_or_else(|| ReelcutError::probe("no audio stream found"))?;
    let video = &output.streams[video_index];
    let audio = &output.streams[audio_index];

    let duration_text = audio
        .duration
        .as_deref()
        .or_else(|| output.format.as_ref().and_then(|f| f.duration.as_deref()))
        .ok_or_else(|| ReelcutError::probe("no duration reported for the audio stream"))?;
    let duration_secs: f64 = duration_text
        .trim()
        .parse()
        .map_err(|_| ReelcutError::probe(format!("invalid duration '{duration_text}'")))?;
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return Err(ReelcutError::probe(format!(
            "invalid duration '{duration_text}'"
        )));
    }
    let duration = TimeValue::from_secs(duration_secs.floor() as i64)
        .map_err(|e| ReelcutError::probe(format!("duration out of range: {e}")))?;

    let frame_rate = video
        .avg_frame_rate
        .as_deref()
        .filter(|rate| reelcut_cut_model::parse_frame_rate(rate).is_some())
        .or_else(|| video.r_frame_rate.as_deref())
        .ok_or_else(|| ReelcutError::probe("video stream has no frame rate"))?
        .to_string();

    let width = video
        .width
        .filter(|w| *w > 0)
        .ok_or_else(|| ReelcutError::probe("video stream has no width"))?;
    let height = video
        .height
        .filter(|h| *h > 0)
        .ok_or_else(|| ReelcutError::probe("video stream has no height"))?;

    let sample_rate = audio
        .sample_rate
        .as_deref()
        .and_then(|rate| rate.trim().parse::<u32>().ok())
        .ok_or_else(|| ReelcutError::probe("audio stream has no sample rate"))?;

    let channel_layout = match (&audio.channel_layout, audio.channels) {
        (Some(layout), _) if !layout.is_empty() => layout.clone(),
        (_, Some(1)) => "mono".to_string(),
        (_, Some(2)) => "stereo".to_string(),
        _ => return Err(ReelcutError::probe("audio stream has no channel layout")),
    };

    Ok(MediaProperties {
        duration,
        frame_rate,
        width,
        height,
        video_codec: required(&video.codec_name, "video codec")?,
        audio_codec: required(&audio.codec_name, "audio codec")?,
        pix_fmt: required(&video.pix_fmt, "pixel format")?,
        sample_rate,
        channel_layout,
        audio_track_precedes_video: audio_index < video_index,
    })
}

fn required(value: &Option<String>, what: &str) -> ReelcutResult<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ReelcutError::probe(format!("ffprobe reported no {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "pix_fmt": "yuv420p",
                "r_frame_rate": "30/1",
                "avg_frame_rate": "30000/1001",
                "duration": "125.100000"
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 2,
                "channel_layout": "stereo",
                "duration": "124.980000"
            }
        ],
        "format": { "duration": "125.100000" }
    }"#;

    #[test]
    fn test_parse_sample() {
        let media = parse_probe_output(SAMPLE).unwrap();
        assert_eq!(media.duration, TimeValue::from_secs(124).unwrap());
        assert_eq!(media.frame_rate, "30000/1001");
        assert_eq!(media.resolution(), "1920x1080");
        assert_eq!(media.video_codec, "h264");
        assert_eq!(media.audio_codec, "aac");
        assert_eq!(media.pix_fmt, "yuv420p");
        assert_eq!(media.sample_rate, 48000);
        assert_eq!(media.channel_layout, "stereo");
        assert!(!media.audio_track_precedes_video);
    }

    #[test]
    fn test_audio_first_stream_order() {
        let json = r#"{"streams": [
            {"codec_type": "audio", "codec_name": "aac", "sample_rate": "44100",
             "channels": 1, "duration": "10.5"},
            {"codec_type": "video", "codec_name": "h264", "width": 640, "height": 480,
             "pix_fmt": "yuv420p", "avg_frame_rate": "25/1"}
        ]}"#;
        let media = parse_probe_output(json).unwrap();
        assert!(media.audio_track_precedes_video);
        assert_eq!(media.channel_layout, "mono");
        assert_eq!(media.duration.as_secs(), 10);
    }

    #[test]
    fn test_falls_back_to_format_duration() {
        let json = r#"{"streams": [
            {"codec_type": "video", "codec_name": "vp9", "width": 640, "height": 360,
             "pix_fmt": "yuv420p", "avg_frame_rate": "0/0", "r_frame_rate": "24/1"},
            {"codec_type": "audio", "codec_name": "opus", "sample_rate": "48000",
             "channel_layout": "stereo"}
        ], "format": {"duration": "61.9"}}"#;
        let media = parse_probe_output(json).unwrap();
        assert_eq!(media.duration.as_secs(), 61);
        assert_eq!(media.frame_rate, "24/1");
    }

    #[test]
    fn test_missing_audio_stream_is_probe_error() {
        let json = r#"{"streams": [
            {"codec_type": "video", "codec_name": "h264", "width": 640, "height": 480,
             "pix_fmt": "yuv420p", "avg_frame_rate": "25/1", "duration": "3.0"}
        ]}"#;
        let err = parse_probe_output(json).unwrap_err();
        assert!(matches!(err, ReelcutError::Probe { .. }));
        assert!(err.to_string().contains("audio"));
    }

    #[test]
    fn test_garbage_is_probe_error() {
        assert!(matches!(
            parse_probe_output("not json").unwrap_err(),
            ReelcutError::Probe { .. }
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = probe_media("ffprobe", Path::new("/definitely/not/here.mp4")).unwrap_err();
        assert!(matches!(err, ReelcutError::FileNotFound { .. }));
    }
}
