//! Work queue between the frame producer and the reader workers.
//!
//! A bounded `sync_channel` keeps the producer from listing far ahead of the
//! workers. Workers share the receiver behind a mutex.

use std::path::PathBuf;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::sync::{Arc, Mutex};

/// One frame to read.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameWorkItem {
    /// Record name, `frame_<seconds>`.
    pub name: String,
    /// Position in the recording, in seconds.
    pub seconds: u32,
    /// Image file holding the frame.
    pub path: PathBuf,
}

impl FrameWorkItem {
    pub fn new(seconds: u32, path: PathBuf) -> Self {
        Self {
            name: format!("frame_{}", seconds),
            seconds,
            path,
        }
    }
}

/// Receiver shared by all workers.
pub type SharedReceiver = Arc<Mutex<Receiver<FrameWorkItem>>>;

/// Creates a work queue holding at most `bound` pending frames.
pub fn create_work_queue(bound: usize) -> (SyncSender<FrameWorkItem>, SharedReceiver) {
    let (sender, receiver) = sync_channel(bound);
    (sender, Arc::new(Mutex::new(receiver)))
}

/// Takes the next item; `None` once the queue is closed and drained.
pub fn next_item(receiver: &SharedReceiver) -> Option<FrameWorkItem> {
    let guard = receiver.lock().unwrap_or_else(|e| e.into_inner());
    guard.recv().ok()
}
