//! Page acquisition: configuration, frame storage, duplicate detection and
//! the capture loop itself.

pub mod config;
pub mod crop;
pub mod fingerprint;
pub mod frame_store;
pub mod loop_worker;

pub use config::{CaptureConfig, CropInsets, Direction, UNBOUNDED_PAGE_LIMIT};
pub use frame_store::{FrameStore, PageFrame};
pub use loop_worker::{run_capture, CaptureResult, FrameGrabber, StopReason};
