//! Batch reading of recorded frames.
//!
//! This module provides:
//! - Reader configuration (`ReaderConfig`)
//! - The frame work queue and reader workers
//! - CSV result output
//! - Run orchestration (`run`)

pub mod config;
pub mod csv_writer;
pub mod queue;
pub mod runner;
pub mod worker;

pub use config::{FrameConfig, ReaderConfig};
pub use csv_writer::{read_results, write_results, CSV_HEADER};
pub use queue::{create_work_queue, FrameWorkItem};
pub use runner::{run, RunOptions, RunSummary};
pub use worker::{run_worker, WorkerContext};
