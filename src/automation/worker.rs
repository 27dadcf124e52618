//! Reader worker threads.
//!
//! Each worker takes frames from the shared work queue, reads them and sends
//! the results back. A frame that cannot be loaded or read is logged and
//! skipped; the worker carries on with the next one.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::automation::config::ReaderConfig;
use crate::automation::queue::{next_item, SharedReceiver};
use crate::debug::DebugSink;
use crate::ocr::{FrameResult, PanelReader, Rotation};

/// Everything a worker needs, shared between all workers.
#[derive(Clone)]
pub struct WorkerContext {
    pub config: Arc<ReaderConfig>,
    pub rotation: Rotation,
    pub debug: Option<Arc<dyn DebugSink>>,
}

/// A frame result tagged with its recording time.
pub type TimedResult = (u32, FrameResult);

/// Runs the worker loop until the queue is closed and drained.
///
/// Returns the number of frames that produced a result.
pub fn run_worker(id: usize, receiver: SharedReceiver, results: Sender<TimedResult>, ctx: WorkerContext) -> usize {
    debug!("Worker {} started", id);

    let reader = PanelReader::new(&ctx.config).with_debug(ctx.debug.as_deref());
    let mut produced = 0;

    while let Some(item) = next_item(&receiver) {
        debug!("Worker {}: processing {} ({})", id, item.name, item.path.display());

        let img = match image::open(&item.path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!("{} - failed to load {}: {}", item.name, item.path.display(), e);
                continue;
            }
        };

        match reader.read_rotated(&item.name, &img, ctx.rotation) {
            Some(result) => {
                info!(
                    "{}: time={} temperature={} profile='{}' power={} fan={} mode={}",
                    result.name,
                    result.time,
                    result.temperature,
                    result.profile,
                    result.power,
                    result.fan,
                    result.mode
                );
                produced += 1;
                if results.send((item.seconds, result)).is_err() {
                    warn!("Worker {}: result channel closed, exiting", id);
                    break;
                }
            }
            None => info!("{} - panel not found", item.name),
        }
    }

    debug!("Worker {} finished", id);
    produced
}
