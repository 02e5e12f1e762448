//! pageturn: capture-orchestration core for turning an on-screen e-reader
//! into text or a PDF.
//!
//! The crate drives an external reader application through N page turns,
//! captures one image per page, detects end-of-book by comparing successive
//! frame fingerprints, and consolidates OCR results (with an optional
//! dark-theme second pass) into an ordered text collection or a multi-page
//! PDF.
//!
//! Hosts wire in the external collaborators (window locator, frame grabber,
//! input injector, text recognizer) through the traits re-exported below.
//! Reference implementations backed by `xcap`, `screencapture`, `osascript`
//! and `tesseract` live under [`platform`].

pub mod advance;
pub mod artifact;
pub mod capture;
pub mod job;
pub mod ocr;
pub mod platform;
pub mod utils;
pub mod window;

pub use advance::{AdvanceStrategy, InputInjector, PageAdvancer};
pub use artifact::OutputTarget;
pub use capture::{
    CaptureConfig, CaptureResult, CropInsets, Direction, FrameGrabber, FrameStore, PageFrame,
    StopReason,
};
pub use job::{Collaborators, EventSink, JobController, JobEvent, JobState};
pub use ocr::{OcrConfig, PageText, TextRecognizer};
pub use window::{WindowBounds, WindowDescriptor, WindowLocator};
