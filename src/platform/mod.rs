//! Reference collaborator implementations for macOS hosts: `xcap` for
//! window enumeration, `screencapture` for frame grabs, `osascript` for key
//! injection and `tesseract` for recognition. Everything here sits behind
//! the seam traits, so hosts on other platforms (or tests) substitute their
//! own implementations without touching the core.

#[cfg(target_os = "macos")]
pub mod locator;
pub mod macos;
pub mod tesseract;

#[cfg(target_os = "macos")]
pub use locator::XcapWindowLocator;
pub use macos::{OsascriptInjector, ScreencaptureGrabber};
pub use tesseract::TesseractRecognizer;
