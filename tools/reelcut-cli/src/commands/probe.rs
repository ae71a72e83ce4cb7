//! Show probed media properties.

use std::path::PathBuf;

use reelcut_common::config::AppConfig;
use reelcut_render_engine::probe_media;

pub fn run(video: PathBuf, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    let media = probe_media(&config.render.ffprobe, &video)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&media)?);
        return Ok(());
    }

    println!("Media: {}", video.display());
    println!("  Duration: {}", media.duration);
    println!("  Video: {} {} {}", media.video_codec, media.resolution(), media.pix_fmt);
    match media.frames_per_second() {
        Some(fps) => println!("  Frame rate: {} ({fps:.3} fps)", media.frame_rate),
        None => println!("  Frame rate: {}", media.frame_rate),
    }
    println!(
        "  Audio: {} {} Hz {}",
        media.audio_codec, media.sample_rate, media.channel_layout
    );
    println!(
        "  Stream order: {}",
        if media.audio_track_precedes_video {
            "audio, video"
        } else {
            "video, audio"
        }
    );
    Ok(())
}
