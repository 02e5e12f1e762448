//! The capture loop: drive the reader through up to N page turns, store one
//! frame per page, and decide autonomously when the book has ended.
//!
//! The reader exposes no page-count API, so the only end-of-book oracle is a
//! successive frame whose fingerprint matches the previous one: the turn
//! command had no effect, meaning the last page was already showing. That
//! also means two genuinely pixel-identical consecutive pages (blank page
//! after blank page) stop the loop early; known limitation.

use std::path::Path;
use std::thread;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::advance::PageAdvancer;
use crate::job::events::EventSink;
use crate::window::WindowDescriptor;

use super::config::CaptureConfig;
use super::crop::apply_crop;
use super::fingerprint::fingerprint_file;
use super::frame_store::{FrameStore, PageFrame};

const ENABLE_LOGS: bool = true;
use crate::log_info;

/// External collaborator that writes a pixel capture of the window to
/// `output`. A failure here is fatal for the job: it means the target
/// window disappeared or became inaccessible mid-run.
pub trait FrameGrabber: Send + Sync {
    fn capture(&self, window: &WindowDescriptor, output: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    /// Two successive frames fingerprinted identically; the duplicate was
    /// discarded and the loop stopped without another page turn.
    AutoStopDuplicate,
    /// All configured iterations ran without ever seeing a duplicate.
    MaxPagesReached,
    /// Cooperative cancellation; frames captured so far are kept.
    ManualStop,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    pub pages_captured: u32,
    pub stop_reason: StopReason,
}

/// Run one capture job against `window`, filling `store`.
///
/// Bounded jobs report percent as `pages / max_pages * progress_scale`;
/// unbounded jobs report an indeterminate progress event per page. The
/// settling delay and the page turn are skipped on the last allowed
/// iteration, where no page follows to render.
#[allow(clippy::too_many_arguments)]
pub fn run_capture(
    grabber: &dyn FrameGrabber,
    advancer: &PageAdvancer<'_>,
    window: &WindowDescriptor,
    config: &CaptureConfig,
    store: &mut FrameStore,
    progress_scale: f32,
    token: &CancellationToken,
    events: &EventSink,
) -> Result<CaptureResult> {
    store.reset()?;

    let limit = config.effective_limit();
    let mut stop_reason = StopReason::MaxPagesReached;

    for i in 0..limit {
        if token.is_cancelled() {
            events.log("manual stop; keeping pages captured so far");
            stop_reason = StopReason::ManualStop;
            break;
        }

        let path = store.frame_path(i);
        grabber
            .capture(window, &path)
            .with_context(|| format!("capturing page {i} from window {}", window.id))?;
        apply_crop(&path, &config.crop)?;
        let fingerprint = fingerprint_file(&path)?;

        let matches_previous = store
            .last()
            .is_some_and(|prev| prev.fingerprint == fingerprint);
        store.push(PageFrame {
            index: i,
            image_path: path.clone(),
            fingerprint,
        });

        if i > 0 && matches_previous {
            store.discard_last()?;
            events.log(format!("last page detected (page {})", store.len()));
            stop_reason = StopReason::AutoStopDuplicate;
            break;
        }

        let captured = store.len() as u32;
        log_info!("captured page {} -> {}", captured, path.display());
        events.log(format!("[{captured}] {}", file_name(&path)));
        events.status(format!("capturing... {captured} pages"));
        events.progress(
            config
                .max_pages
                .map(|max| captured as f32 / max as f32 * progress_scale),
        );

        if i + 1 < limit {
            advancer.advance(window, config.direction);
            thread::sleep(config.delay);
        }
    }

    Ok(CaptureResult {
        pages_captured: store.len() as u32,
        stop_reason,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
