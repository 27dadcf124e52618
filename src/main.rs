//! Skywalker Reader
//!
//! Reads the seven-segment panel of a coffee roaster from the frames of a
//! roast recording and writes one CSV row per sampled frame.

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use anyhow::Result;
use clap::Parser;
use log::{error, info};

use skywalker_reader::automation::{run, ReaderConfig, RunOptions};
use skywalker_reader::capture::SamplingOptions;
use skywalker_reader::logging;
use skywalker_reader::ocr::Rotation;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Reads roaster panel values from recorded video frames",
    long_about = "Reads the seven-segment panel of a coffee roaster from recorded video frames.\n\n\
        INPUT is a single image or a directory of frames extracted from the recording \
        (png, jpg, jpeg or bmp, ordered by file name). One frame is read every --interval \
        seconds and the readings are written to OUTPUT/results.csv."
)]
struct Args {
    /// Image file or directory of extracted frames
    input: PathBuf,

    /// Output directory
    output: PathBuf,

    #[arg(long, default_value_t = 0, help = "Seconds to skip at the start of the recording")]
    skip: u32,

    #[arg(long, default_value_t = 0, help = "Number of frames to read, 0 for all")]
    count: u32,

    #[arg(long, default_value_t = 30, help = "Seconds between read frames")]
    interval: u32,

    #[arg(
        long,
        default_value_t = 1.0,
        help = "Frame rate the frames were extracted at",
        long_help = "Frame rate the frame directory was extracted at. The frame for second s \
            is the file at index round(s * fps) in name order."
    )]
    fps: f64,

    #[arg(
        long,
        default_value_t = Rotation::Auto,
        help = "Frame rotation: auto, 0, 90, 180 or 270",
        long_help = "Clockwise rotation applied before reading. 'auto' tries 0, 90, 180 and \
            270 degrees in that order and keeps the first orientation the panel is found in."
    )]
    rotate: Rotation,

    #[arg(long, help = "Write debug images to OUTPUT/debug/")]
    debug: bool,

    #[arg(long, help = "Write per-digit cell images (implies --debug)")]
    training: bool,

    #[arg(short, long, help = "Worker threads [default: available cores]")]
    jobs: Option<usize>,

    #[arg(long, help = "Reader configuration file (JSON)")]
    config: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Write the default configuration and exit")]
    dump_config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, help = "More log output (-v, -vv)")]
    verbose: u8,
}

fn default_jobs() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn execute(args: Args) -> Result<()> {
    if let Some(path) = &args.dump_config {
        ReaderConfig::default().save(path)?;
        info!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = ReaderConfig::load_or_default(args.config.as_deref())?;

    let options = RunOptions {
        input: args.input,
        output: args.output,
        sampling: SamplingOptions {
            skip: args.skip,
            count: args.count,
            interval: args.interval,
            fps: args.fps,
        },
        rotation: args.rotate,
        debug: args.debug || args.training,
        jobs: args.jobs.unwrap_or_else(default_jobs),
        config,
    };

    info!(
        "Reading {} (skip={}s interval={}s count={} rotate={})",
        options.input.display(),
        options.sampling.skip,
        options.sampling.interval,
        options.sampling.count,
        options.rotation
    );

    let summary = run(options)?;
    info!(
        "Done: {} of {} frame(s) read",
        summary.results.len(),
        summary.queued
    );
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
