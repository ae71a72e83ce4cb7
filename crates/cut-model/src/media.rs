//! Probed properties of a source media file.

use serde::{Deserialize, Serialize};

use crate::timecode::TimeValue;

/// Snapshot of the first video and first audio stream of one file.
///
/// Rendered clips (fades, blanks) must match these so the final
/// concatenation does not need to resample or rescale anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaProperties {
    /// Playable duration, floored to whole seconds.
    pub duration: TimeValue,

    /// Average frame rate as reported by the prober (e.g. `30000/1001`).
    pub frame_rate: String,

    /// Video width in pixels.
    pub width: u32,

    /// Video height in pixels.
    pub height: u32,

    /// Video codec name (e.g. `h264`).
    pub video_codec: String,

    /// Audio codec name (e.g. `aac`).
    pub audio_codec: String,

    /// Pixel format (e.g. `yuv420p`).
    pub pix_fmt: String,

    /// Audio sample rate in Hz.
    pub sample_rate: u32,

    /// Audio channel layout (e.g. `stereo`).
    pub channel_layout: String,

    /// Whether the audio stream comes before the video stream in the file.
    pub audio_track_precedes_video: bool,
}

impl MediaProperties {
    /// Frame rate as frames per second, if the text is a valid rate.
    pub fn frames_per_second(&self) -> Option<f64> {
        parse_frame_rate(&self.frame_rate)
    }

    /// `WIDTHxHEIGHT` size string.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Parse `num/den` or plain decimal frame rates.
pub fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }

    #[test]
    fn test_serialization_keeps_timecode_text() {
        let media = MediaProperties {
            duration: TimeValue::from_secs(125).unwrap(),
            frame_rate: "30/1".to_string(),
            width: 1280,
            height: 720,
            video_codec: "h264".to_string(),
            audio_codec: "aac".to_string(),
            pix_fmt: "yuv420p".to_string(),
            sample_rate: 48000,
            channel_layout: "stereo".to_string(),
            audio_track_precedes_video: false,
        };

        let json = serde_json::to_value(&media).unwrap();
        assert_eq!(json["duration"], "00:02:05");
        assert_eq!(media.resolution(), "1280x720");
    }
}
