//! Reelcut CLI: cut a recording into faded clips and map output time back to real time.
//!
//! Usage:
//!   reelcut chop <VIDEO> <TABLE>     Render the clips listed in a table
//!   reelcut plan <TABLE>             Show the segment plan without rendering
//!   reelcut probe <VIDEO>            Show media properties
//!   reelcut check                    Check for ffmpeg/ffprobe

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reelcut_common::config::AppConfig;

mod commands;

use commands::TableArgs;

#[derive(Parser)]
#[command(
    name = "reelcut",
    about = "Cut a recording into faded clips with gaps and export its timebase",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cut a video into the clips listed in a table and join them
    Chop {
        /// Source video file
        video: PathBuf,

        #[command(flatten)]
        table: TableArgs,

        /// Output file (default: processed_<VIDEO> next to the video)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the output/real timebase to this file (.csv or .json)
        #[arg(short = 't', long)]
        timebase: Option<PathBuf>,

        /// Overwrite existing output and timebase files
        #[arg(long)]
        force: bool,

        /// Maximum number of concurrent ffmpeg processes
        #[arg(short = 'j', long)]
        jobs: Option<usize>,
    },

    /// Plan the cut and print it without rendering
    Plan {
        #[command(flatten)]
        table: TableArgs,

        /// Probe this video for its duration
        #[arg(long, conflicts_with = "duration", required_unless_present = "duration")]
        video: Option<PathBuf>,

        /// Media duration as HH:MM:SS
        #[arg(long)]
        duration: Option<String>,

        /// Write the output/real timebase to this file (.csv or .json)
        #[arg(short = 't', long)]
        timebase: Option<PathBuf>,

        /// Overwrite an existing timebase file
        #[arg(long)]
        force: bool,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the media properties used for rendering
    Probe {
        /// Video file to inspect
        video: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check for the external tools rendering needs
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reelcut_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Chop {
            video,
            table,
            output,
            timebase,
            force,
            jobs,
        } => {
            commands::chop::run(
                commands::chop::ChopOptions {
                    video,
                    table,
                    output,
                    timebase,
                    force,
                    jobs,
                },
                &config,
            )
            .await
        }
        Commands::Plan {
            table,
            video,
            duration,
            timebase,
            force,
            json,
        } => commands::plan::run(table, video, duration, timebase, force, json, &config),
        Commands::Probe { video, json } => commands::probe::run(video, json, &config),
        Commands::Check => commands::check::run(&config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_chop_flags() {
        let cli = Cli::try_parse_from([
            "reelcut", "chop", "talk.mp4", "cuts.csv", "-s", "begin", "-p", "end", "-g", "pause",
            "-f", "2", "-t", "map.csv", "-r", "09:30:00", "--force", "-j", "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Chop {
                video,
                table,
                timebase,
                force,
                jobs,
                ..
            } => {
                assert_eq!(video, PathBuf::from("talk.mp4"));
                assert_eq!(table.table, PathBuf::from("cuts.csv"));
                assert_eq!(table.start_column.as_deref(), Some("begin"));
                assert_eq!(table.stop_column.as_deref(), Some("end"));
                assert_eq!(table.gap_column.as_deref(), Some("pause"));
                assert_eq!(table.fade_length, Some(2));
                assert_eq!(table.real_time.as_deref(), Some("09:30:00"));
                assert_eq!(timebase, Some(PathBuf::from("map.csv")));
                assert!(force);
                assert_eq!(jobs, Some(4));
            }
            _ => panic!("expected chop"),
        }
    }

    #[test]
    fn test_plan_needs_video_or_duration() {
        assert!(Cli::try_parse_from(["reelcut", "plan", "cuts.csv"]).is_err());
        assert!(Cli::try_parse_from(["reelcut", "plan", "cuts.csv", "--duration", "00:10:00"]).is_ok());
        assert!(Cli::try_parse_from([
            "reelcut", "plan", "cuts.csv", "--duration", "00:10:00", "--video", "a.mp4"
        ])
        .is_err());
    }
}
