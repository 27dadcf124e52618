//! Run orchestration.
//!
//! Opens the input, spawns the reader workers, feeds them sampled frames and
//! writes the collected results once every worker has finished.

use anyhow::{anyhow, Result};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::thread;

use crate::automation::config::ReaderConfig;
use crate::automation::csv_writer::write_results;
use crate::automation::queue::create_work_queue;
use crate::automation::worker::{run_worker, TimedResult, WorkerContext};
use crate::capture::{FrameSource, SamplingOptions};
use crate::debug::{DebugSink, DirectorySink};
use crate::ocr::{FrameResult, Rotation};
use crate::paths::{debug_dir, prepare_output, results_path};

/// Pending frames per worker in the work queue.
const QUEUE_DEPTH_PER_WORKER: usize = 2;

/// Settings of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub sampling: SamplingOptions,
    pub rotation: Rotation,
    pub debug: bool,
    pub jobs: usize,
    pub config: ReaderConfig,
}

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Frames handed to the workers.
    pub queued: usize,
    /// Results, sorted by recording time.
    pub results: Vec<FrameResult>,
    /// Results file, if one was written.
    pub csv_path: Option<PathBuf>,
}

/// Reads every sampled frame of `options.input` and writes `results.csv`.
///
/// Errors opening the input or writing the output abort the run; a frame
/// that cannot be read is only logged.
pub fn run(options: RunOptions) -> Result<RunSummary> {
    options.sampling.validate()?;
    let source = FrameSource::open(&options.input)?;
    prepare_output(&options.output)?;

    let debug: Option<Arc<dyn DebugSink>> = if options.debug {
        let sink = DirectorySink::new(&debug_dir(&options.output))?;
        info!("Debug images: {}", sink.root().display());
        Some(Arc::new(sink))
    } else {
        None
    };

    let jobs = options.jobs.max(1);
    let ctx = WorkerContext {
        config: Arc::new(options.config),
        rotation: options.rotation,
        debug,
    };

    let (sender, receiver) = create_work_queue(jobs * QUEUE_DEPTH_PER_WORKER);
    let (result_tx, result_rx) = channel::<TimedResult>();

    info!("Starting {} worker(s)", jobs);
    let mut handles = Vec::with_capacity(jobs);
    for id in 0..jobs {
        let receiver = Arc::clone(&receiver);
        let result_tx = result_tx.clone();
        let ctx = ctx.clone();
        handles.push(thread::spawn(move || run_worker(id, receiver, result_tx, ctx)));
    }
    drop(result_tx);

    let mut queued = 0;
    for item in source.sample(options.sampling) {
        if sender.send(item).is_err() {
            warn!("All workers exited, stopping early");
            break;
        }
        queued += 1;
    }
    // Closing the queue lets the workers drain it and exit
    drop(sender);
    info!("Queued {} frame(s)", queued);

    let mut timed: Vec<TimedResult> = result_rx.iter().collect();

    let mut panicked = 0;
    for handle in handles {
        if handle.join().is_err() {
            panicked += 1;
        }
    }
    if panicked > 0 {
        return Err(anyhow!("{} worker thread(s) panicked", panicked));
    }

    timed.sort_by_key(|(seconds, _)| *seconds);
    let results: Vec<FrameResult> = timed.into_iter().map(|(_, result)| result).collect();

    let csv_path = results_path(&options.output);
    let csv_path = if write_results(&csv_path, &results)? {
        info!("Wrote {} result(s) to {}", results.len(), csv_path.display());
        Some(csv_path)
    } else {
        warn!("No frame produced a result, {} not written", csv_path.display());
        None
    };

    Ok(RunSummary {
        queued,
        results,
        csv_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::csv_writer::read_results;
    use crate::ocr::testing::place_text;
    use image::RgbImage;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_frame(dir: &Path, index: usize, text: Option<&str>) {
        let mut img = RgbImage::new(400, 300);
        if let Some(text) = text {
            place_text(&mut img, (200.0, 150.0), text, 5);
        }
        img.save(dir.join(format!("{:04}.png", index))).unwrap();
    }

    fn options(input: &Path, output: &Path) -> RunOptions {
        RunOptions {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            sampling: SamplingOptions {
                interval: 1,
                ..SamplingOptions::default()
            },
            rotation: Rotation::Fixed(0),
            debug: false,
            jobs: 3,
            config: ReaderConfig::default(),
        }
    }

    #[test]
    fn test_run_writes_sorted_results() {
        let dir = tempdir().unwrap();
        let frames = dir.path().join("frames");
        fs::create_dir_all(&frames).unwrap();
        write_frame(&frames, 0, Some("3"));
        write_frame(&frames, 1, None);
        write_frame(&frames, 2, Some("8"));
        write_frame(&frames, 3, Some("5"));
        let output = dir.path().join("out");

        let summary = run(options(&frames, &output)).unwrap();

        assert_eq!(summary.queued, 4);
        let names: Vec<&str> = summary.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["frame_0", "frame_2", "frame_3"]);
        let powers: Vec<i32> = summary.results.iter().map(|r| r.power).collect();
        assert_eq!(powers, vec![3, 8, 5]);

        let csv_path = summary.csv_path.unwrap();
        assert_eq!(csv_path, results_path(&output));
        assert_eq!(read_results(&csv_path).unwrap(), summary.results);
        assert!(!debug_dir(&output).exists());
    }

    #[test]
    fn test_run_with_debug_and_count() {
        let dir = tempdir().unwrap();
        let frames = dir.path().join("frames");
        fs::create_dir_all(&frames).unwrap();
        for i in 0..5 {
            write_frame(&frames, i, Some("6"));
        }
        let output = dir.path().join("out");
        let mut opts = options(&frames, &output);
        opts.sampling.count = 2;
        opts.debug = true;
        opts.jobs = 1;

        let summary = run(opts).unwrap();

        assert_eq!(summary.queued, 2);
        assert_eq!(summary.results.len(), 2);
        assert!(debug_dir(&output).join("frame_0").is_dir());
        assert!(debug_dir(&output).join("frame_1").is_dir());
        assert!(!debug_dir(&output).join("frame_2").exists());
    }

    #[test]
    fn test_run_without_results_writes_no_csv() {
        let dir = tempdir().unwrap();
        let frames = dir.path().join("frames");
        fs::create_dir_all(&frames).unwrap();
        write_frame(&frames, 0, None);
        let output = dir.path().join("out");

        let summary = run(options(&frames, &output)).unwrap();

        assert_eq!(summary.queued, 1);
        assert!(summary.results.is_empty());
        assert!(summary.csv_path.is_none());
        assert!(!results_path(&output).exists());
    }

    #[test]
    fn test_run_missing_input_is_fatal() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out");

        assert!(run(options(&dir.path().join("missing"), &output)).is_err());
        assert!(!output.exists());
    }
}
