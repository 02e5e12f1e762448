//! Background job execution.
//!
//! One controller runs at most one job. The job itself is blocking work
//! (subprocess waits, sleeps between page turns) and runs on a blocking
//! thread; the async surface only manages state, cancellation and join.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::advance::{InputInjector, PageAdvancer};
use crate::artifact::{self, OutputTarget};
use crate::capture::config::CaptureConfig;
use crate::capture::frame_store::FrameStore;
use crate::capture::loop_worker::{run_capture, FrameGrabber, StopReason};
use crate::ocr::{consolidate, OcrConfig, TextRecognizer};
use crate::window::WindowDescriptor;

use super::events::{EventSink, JobEvent};

const ENABLE_LOGS: bool = true;
use crate::log_info;

// Capture's share of the progress bar when further phases follow it.
const CAPTURE_SPAN_BEFORE_OCR: f32 = 50.0;
const CAPTURE_SPAN_BEFORE_PDF: f32 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Idle,
    Running,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
}

impl Default for JobState {
    fn default() -> Self {
        JobState::Idle
    }
}

/// The platform-facing collaborators a job needs. Bundled so hosts and
/// tests swap the whole set at once.
#[derive(Clone)]
pub struct Collaborators {
    pub grabber: Arc<dyn FrameGrabber>,
    pub injector: Arc<dyn InputInjector>,
    pub recognizer: Arc<dyn TextRecognizer>,
}

pub struct JobController {
    collaborators: Collaborators,
    working_dir: PathBuf,
    events: EventSink,
    state: Arc<Mutex<JobState>>,
    cancel_token: Arc<Mutex<Option<CancellationToken>>>,
    handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl JobController {
    pub fn new(
        collaborators: Collaborators,
        working_dir: impl Into<PathBuf>,
    ) -> (Self, tokio::sync::mpsc::UnboundedReceiver<JobEvent>) {
        let (events, rx) = EventSink::channel();
        (
            Self {
                collaborators,
                working_dir: working_dir.into(),
                events,
                state: Arc::new(Mutex::new(JobState::Idle)),
                cancel_token: Arc::new(Mutex::new(None)),
                handle: Arc::new(Mutex::new(None)),
            },
            rx,
        )
    }

    /// Start a capture job against `window`. Fails if a job is already
    /// running; finished jobs of any outcome can be followed by a new one.
    pub async fn start_capture(
        &self,
        window: WindowDescriptor,
        capture: CaptureConfig,
        ocr: OcrConfig,
        output: OutputTarget,
    ) -> Result<()> {
        if capture.max_pages == Some(0) {
            bail!("max pages must be at least 1");
        }
        let token = self.begin().await?;

        let collaborators = self.collaborators.clone();
        let working_dir = self.working_dir.clone();
        let events = self.events.clone();
        let worker_token = token.clone();
        let job = tokio::task::spawn_blocking(move || {
            capture_job(
                &collaborators,
                &window,
                &capture,
                &ocr,
                &output,
                working_dir,
                &worker_token,
                &events,
            )
        });

        self.supervise(job, token).await;
        Ok(())
    }

    /// Re-run text extraction over frames a previous capture left in the
    /// working directory, without touching the reader.
    pub async fn start_ocr_only(&self, ocr: OcrConfig, output: OutputTarget) -> Result<()> {
        if output == OutputTarget::FramesOnly {
            bail!("frames-only output leaves nothing for an extraction job to do");
        }
        let token = self.begin().await?;

        let collaborators = self.collaborators.clone();
        let working_dir = self.working_dir.clone();
        let events = self.events.clone();
        let worker_token = token.clone();
        let job = tokio::task::spawn_blocking(move || {
            ocr_only_job(
                &collaborators,
                &ocr,
                &output,
                working_dir,
                &worker_token,
                &events,
            )
        });

        self.supervise(job, token).await;
        Ok(())
    }

    /// Request cooperative cancellation. The job notices between pages;
    /// frames captured so far stay on disk.
    pub async fn cancel(&self) {
        let mut state = self.state.lock().await;
        if *state != JobState::Running {
            return;
        }
        *state = JobState::Cancelling;
        drop(state);

        if let Some(token) = self.cancel_token.lock().await.as_ref() {
            token.cancel();
        }
        self.events.log("stop requested, finishing current page");
        self.events.status("stopping...");
    }

    pub async fn state(&self) -> JobState {
        *self.state.lock().await
    }

    /// Wait for the active job to finish, if any.
    pub async fn wait(&self) {
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    async fn begin(&self) -> Result<CancellationToken> {
        let mut state = self.state.lock().await;
        if matches!(*state, JobState::Running | JobState::Cancelling) {
            bail!("a job is already running");
        }
        *state = JobState::Running;
        drop(state);

        let token = CancellationToken::new();
        *self.cancel_token.lock().await = Some(token.clone());
        Ok(token)
    }

    /// Wrap the blocking job so its outcome settles the shared state once
    /// the thread joins.
    async fn supervise(&self, job: JoinHandle<Result<()>>, token: CancellationToken) {
        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let supervisor = tokio::spawn(async move {
            let outcome = match job.await {
                Ok(Ok(())) if token.is_cancelled() => {
                    events.status("stopped");
                    JobState::Cancelled
                }
                Ok(Ok(())) => JobState::Completed,
                Ok(Err(err)) => {
                    events.log(format!("job failed: {err:#}"));
                    events.status("failed");
                    JobState::Failed
                }
                Err(join_err) => {
                    events.log(format!("job crashed: {join_err}"));
                    events.status("failed");
                    JobState::Failed
                }
            };
            *state.lock().await = outcome;
        });
        *self.handle.lock().await = Some(supervisor);
    }
}

#[allow(clippy::too_many_arguments)]
fn capture_job(
    collaborators: &Collaborators,
    window: &WindowDescriptor,
    capture: &CaptureConfig,
    ocr: &OcrConfig,
    output: &OutputTarget,
    working_dir: PathBuf,
    token: &CancellationToken,
    events: &EventSink,
) -> Result<()> {
    let mut store = FrameStore::new(working_dir);
    let advancer = PageAdvancer::new(&*collaborators.injector, window);

    log_info!(
        "starting capture of {} via {:?}",
        window.label,
        advancer.strategy()
    );
    events.status("starting capture...");
    events.progress(Some(0.0));
    advancer.activate(window);

    let capture_scale = match output {
        OutputTarget::Text(_) => CAPTURE_SPAN_BEFORE_OCR,
        OutputTarget::Pdf(_) => CAPTURE_SPAN_BEFORE_PDF,
        OutputTarget::FramesOnly => 100.0,
    };
    let result = run_capture(
        &*collaborators.grabber,
        &advancer,
        window,
        capture,
        &mut store,
        capture_scale,
        token,
        events,
    )?;

    if result.pages_captured == 0 {
        events.status("stopped before any page was captured");
        return Ok(());
    }
    if result.stop_reason == StopReason::ManualStop {
        events.status(format!(
            "stopped; {} pages kept in {}",
            result.pages_captured,
            store.root().display()
        ));
        return Ok(());
    }

    finish(collaborators, &store, ocr, output, token, events, capture_scale)
}

fn ocr_only_job(
    collaborators: &Collaborators,
    ocr: &OcrConfig,
    output: &OutputTarget,
    working_dir: PathBuf,
    token: &CancellationToken,
    events: &EventSink,
) -> Result<()> {
    let mut store = FrameStore::new(working_dir);
    let found = store
        .scan_existing()
        .context("scanning working directory for page frames")?;
    if found == 0 {
        bail!(
            "no page frames found in {}, run a capture first",
            store.root().display()
        );
    }

    events.log(format!("found {found} existing pages"));
    events.progress(Some(0.0));
    finish(collaborators, &store, ocr, output, token, events, 0.0)
}

/// Shared tail of both job kinds: turn the stored frames into the
/// requested artifact. `progress_base` is the percent the phases before
/// this one already consumed.
fn finish(
    collaborators: &Collaborators,
    store: &FrameStore,
    ocr: &OcrConfig,
    output: &OutputTarget,
    token: &CancellationToken,
    events: &EventSink,
    progress_base: f32,
) -> Result<()> {
    match output {
        OutputTarget::Text(path) => {
            events.status("extracting text...");
            let pages = consolidate(
                &*collaborators.recognizer,
                store.frames(),
                ocr,
                token,
                events,
                progress_base,
                100.0 - progress_base,
            );
            // Extraction over a non-empty store only comes back empty when
            // the cancel landed before the first page; nothing to write then.
            if pages.is_empty() {
                events.status("stopped before any text was recognized");
                return Ok(());
            }
            // A cancel mid-extraction still writes what was recognized.
            artifact::write_text(&pages, path)?;
            let chars: usize = pages.iter().map(|p| p.text.chars().count()).sum();
            events.status(format!(
                "done: {} pages, {chars} characters -> {}",
                pages.len(),
                path.display()
            ));
        }
        OutputTarget::Pdf(path) => {
            events.status("assembling pdf...");
            artifact::write_pdf(store.frames(), path)?;
            events.status(format!(
                "done: {} pages -> {}",
                store.len(),
                path.display()
            ));
        }
        OutputTarget::FramesOnly => {
            events.status(format!(
                "done: {} pages kept in {}",
                store.len(),
                store.root().display()
            ));
        }
    }
    events.progress(Some(100.0));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::capture::config::Direction;

    struct SequenceGrabber {
        pages: Vec<&'static [u8]>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FrameGrabber for SequenceGrabber {
        fn capture(&self, _: &WindowDescriptor, output: &Path) -> Result<()> {
            std::thread::sleep(self.delay);
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            // Repeat the last scripted page forever so an unbounded run
            // terminates through duplicate detection.
            let bytes = self.pages[call.min(self.pages.len() - 1)];
            fs::write(output, bytes)?;
            Ok(())
        }
    }

    struct NoopInjector;

    impl InputInjector for NoopInjector {
        fn send_browser_key(&self, _: &WindowDescriptor, _: Direction) -> Result<()> {
            Ok(())
        }
        fn send_process_key(&self, _: &str, _: Direction) -> Result<()> {
            Ok(())
        }
        fn send_global_key(&self, _: Direction) -> Result<()> {
            Ok(())
        }
        fn activate(&self, _: &WindowDescriptor) -> Result<()> {
            Ok(())
        }
    }

    struct EchoRecognizer;

    impl TextRecognizer for EchoRecognizer {
        fn recognize(&self, image_path: &Path, _: &[String]) -> Result<String> {
            Ok(fs::read_to_string(image_path).unwrap_or_default())
        }
    }

    fn controller(
        pages: Vec<&'static [u8]>,
        delay: Duration,
        working_dir: &Path,
    ) -> (JobController, tokio::sync::mpsc::UnboundedReceiver<JobEvent>) {
        let collaborators = Collaborators {
            grabber: Arc::new(SequenceGrabber {
                pages,
                delay,
                calls: AtomicUsize::new(0),
            }),
            injector: Arc::new(NoopInjector),
            recognizer: Arc::new(EchoRecognizer),
        };
        JobController::new(collaborators, working_dir)
    }

    fn test_window() -> WindowDescriptor {
        WindowDescriptor::new(
            3,
            "Kindle".into(),
            "A Book".into(),
            crate::window::WindowBounds {
                x: 0.0,
                y: 0.0,
                width: 800.0,
                height: 600.0,
            },
        )
    }

    fn fast_capture() -> CaptureConfig {
        CaptureConfig {
            delay: Duration::from_millis(0),
            ..Default::default()
        }
    }

    fn flat_ocr() -> OcrConfig {
        OcrConfig {
            dark_mode_fallback: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn capture_then_text_job_completes_with_delimited_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("book.txt");
        let (controller, _rx) = controller(
            vec![b"one", b"two", b"three"],
            Duration::from_millis(0),
            dir.path(),
        );

        controller
            .start_capture(
                test_window(),
                fast_capture(),
                flat_ocr(),
                OutputTarget::Text(output.clone()),
            )
            .await
            .unwrap();
        controller.wait().await;

        assert_eq!(controller.state().await, JobState::Completed);
        let body = fs::read_to_string(&output).unwrap();
        assert_eq!(body, "one\n\n---\n\ntwo\n\n---\n\nthree");
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, _rx) = controller(
            vec![b"a", b"b", b"c", b"d"],
            Duration::from_millis(40),
            dir.path(),
        );

        controller
            .start_capture(
                test_window(),
                fast_capture(),
                flat_ocr(),
                OutputTarget::FramesOnly,
            )
            .await
            .unwrap();

        let err = controller
            .start_capture(
                test_window(),
                fast_capture(),
                flat_ocr(),
                OutputTarget::FramesOnly,
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already running"));

        controller.wait().await;
        assert_eq!(controller.state().await, JobState::Completed);
    }

    #[tokio::test]
    async fn cancel_settles_cancelled_and_keeps_frames() {
        let dir = tempfile::tempdir().unwrap();
        let pages: Vec<&'static [u8]> =
            vec![b"a", b"b", b"c", b"d", b"e", b"f", b"g", b"h", b"i", b"j"];
        let (controller, _rx) = controller(pages, Duration::from_millis(30), dir.path());

        controller
            .start_capture(
                test_window(),
                fast_capture(),
                flat_ocr(),
                OutputTarget::Text(dir.path().join("book.txt")),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        controller.cancel().await;
        controller.wait().await;

        assert_eq!(controller.state().await, JobState::Cancelled);
        // At least the first captured frame survives the stop.
        assert!(dir.path().join("page_0000.png").exists());
        // Capture was cut short, so no artifact was produced.
        assert!(!dir.path().join("book.txt").exists());
    }

    #[tokio::test]
    async fn zero_max_pages_is_rejected_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, _rx) = controller(vec![b"a"], Duration::from_millis(0), dir.path());

        let err = controller
            .start_capture(
                test_window(),
                CaptureConfig {
                    max_pages: Some(0),
                    ..fast_capture()
                },
                flat_ocr(),
                OutputTarget::FramesOnly,
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("at least 1"));
        assert_eq!(controller.state().await, JobState::Idle);
    }

    #[tokio::test]
    async fn ocr_only_job_reuses_existing_frames() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("page_0000.png"), b"alpha").unwrap();
        fs::write(dir.path().join("page_0001.png"), b"beta").unwrap();
        let output = dir.path().join("book.txt");
        let (controller, _rx) = controller(vec![b"unused"], Duration::from_millis(0), dir.path());

        controller
            .start_ocr_only(flat_ocr(), OutputTarget::Text(output.clone()))
            .await
            .unwrap();
        controller.wait().await;

        assert_eq!(controller.state().await, JobState::Completed);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "alpha\n\n---\n\nbeta"
        );
    }

    #[tokio::test]
    async fn ocr_only_with_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, _rx) = controller(vec![b"unused"], Duration::from_millis(0), dir.path());

        controller
            .start_ocr_only(flat_ocr(), OutputTarget::Text(dir.path().join("out.txt")))
            .await
            .unwrap();
        controller.wait().await;

        assert_eq!(controller.state().await, JobState::Failed);
    }

    #[tokio::test]
    async fn cancel_before_first_recognized_page_writes_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("page_0000.png"), b"alpha").unwrap();
        let output = dir.path().join("book.txt");

        let collaborators = Collaborators {
            grabber: Arc::new(SequenceGrabber {
                pages: vec![b"unused"],
                delay: Duration::from_millis(0),
                calls: AtomicUsize::new(0),
            }),
            injector: Arc::new(NoopInjector),
            recognizer: Arc::new(EchoRecognizer),
        };
        let mut store = FrameStore::new(dir.path());
        store.scan_existing().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let (events, _rx) = EventSink::channel();

        finish(
            &collaborators,
            &store,
            &flat_ocr(),
            &OutputTarget::Text(output.clone()),
            &token,
            &events,
            0.0,
        )
        .unwrap();

        assert!(!output.exists());
    }

    #[tokio::test]
    async fn finished_job_allows_a_new_start() {
        let dir = tempfile::tempdir().unwrap();
        let (controller, _rx) = controller(vec![b"a", b"b"], Duration::from_millis(0), dir.path());

        controller
            .start_capture(
                test_window(),
                fast_capture(),
                flat_ocr(),
                OutputTarget::FramesOnly,
            )
            .await
            .unwrap();
        controller.wait().await;
        assert_eq!(controller.state().await, JobState::Completed);

        controller
            .start_capture(
                test_window(),
                fast_capture(),
                flat_ocr(),
                OutputTarget::FramesOnly,
            )
            .await
            .unwrap();
        controller.wait().await;
        assert_eq!(controller.state().await, JobState::Completed);
    }
}
