//! Check for the external tools rendering needs.

use reelcut_common::config::{config_file_path, AppConfig};
use reelcut_render_engine::{FfmpegBackend, RenderBackend};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Reelcut System Check");
    println!("{}", "=".repeat(50));

    let ffmpeg = FfmpegBackend::new(&config.render.ffmpeg);
    let ffmpeg_ok = ffmpeg.is_available();
    report("ffmpeg", &config.render.ffmpeg, ffmpeg_ok);

    let ffprobe_ok = which::which(&config.render.ffprobe).is_ok();
    report("ffprobe", &config.render.ffprobe, ffprobe_ok);

    let path = config_file_path();
    println!(
        "[{}] Config: {}",
        if path.exists() { "OK" } else { "--" },
        path.display()
    );
    println!("     Render workers: {}", config.render.workers);

    println!();
    if ffmpeg_ok && ffprobe_ok {
        println!("All required tools are available. Reelcut is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg or set render.ffmpeg/render.ffprobe in the config.");
    }

    Ok(())
}

fn report(tool: &str, binary: &str, available: bool) {
    if available {
        println!("[OK] {tool}: {binary}");
    } else {
        println!("[MISSING] {tool}: {binary} not found");
    }
}
