//! Page-advance dispatch.
//!
//! Turning a page is best-effort: a missed keystroke must not abort a
//! multi-minute capture job, so injector errors are logged and swallowed. A
//! missed advance surfaces later as a duplicate-frame auto-stop instead.

use anyhow::Result;
use serde::Serialize;

use crate::capture::config::Direction;
use crate::window::WindowDescriptor;

const ENABLE_LOGS: bool = true;
use crate::log_warn;

/// Chromium-family owners that expose a scripting surface we can reach the
/// correct tab through, even when the window is not frontmost.
const SCRIPTABLE_BROWSERS: &[&str] = &["chrome", "chromium", "brave", "edge"];

/// External collaborator that delivers key events to the target application.
pub trait InputInjector: Send + Sync {
    /// Dispatch a synthetic arrow-key event through the browser's own
    /// scripting surface, addressed to the tab matching the window title.
    fn send_browser_key(&self, window: &WindowDescriptor, direction: Direction) -> Result<()>;

    /// Send a platform key-code event scoped to the named process, bringing
    /// it frontmost first if the platform requires focus for key delivery.
    fn send_process_key(&self, process_name: &str, direction: Direction) -> Result<()>;

    /// Post a raw global arrow-key event to whatever currently has focus.
    fn send_global_key(&self, direction: Direction) -> Result<()>;

    /// Bring the target window (and, for browsers, the right tab) to the
    /// foreground before the first page turn of a job.
    fn activate(&self, window: &WindowDescriptor) -> Result<()>;
}

/// How page-turn commands reach the target. Chosen once per job from the
/// window descriptor and held fixed for the job's duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AdvanceStrategy {
    BrowserScript,
    ProcessKey,
    GlobalKey,
}

impl AdvanceStrategy {
    pub fn for_window(window: &WindowDescriptor) -> Self {
        let owner = window.owner_name.to_lowercase();
        if owner.is_empty() {
            AdvanceStrategy::GlobalKey
        } else if SCRIPTABLE_BROWSERS.iter().any(|b| owner.contains(b)) {
            AdvanceStrategy::BrowserScript
        } else {
            AdvanceStrategy::ProcessKey
        }
    }
}

pub struct PageAdvancer<'a> {
    injector: &'a dyn InputInjector,
    strategy: AdvanceStrategy,
}

impl<'a> PageAdvancer<'a> {
    pub fn new(injector: &'a dyn InputInjector, window: &WindowDescriptor) -> Self {
        Self {
            injector,
            strategy: AdvanceStrategy::for_window(window),
        }
    }

    pub fn strategy(&self) -> AdvanceStrategy {
        self.strategy
    }

    /// Bring the target to the foreground. Best-effort; capture of a
    /// background window still works on platforms that allow it.
    pub fn activate(&self, window: &WindowDescriptor) {
        if let Err(err) = self.injector.activate(window) {
            log_warn!("could not activate {}: {err:#}", window.label);
        }
    }

    /// Issue one page-turn. Never fails the job; errors are logged with the
    /// strategy so a systematically broken injector is visible in the log.
    pub fn advance(&self, window: &WindowDescriptor, direction: Direction) {
        let result = match self.strategy {
            AdvanceStrategy::BrowserScript => self.injector.send_browser_key(window, direction),
            AdvanceStrategy::ProcessKey => {
                self.injector.send_process_key(&window.owner_name, direction)
            }
            AdvanceStrategy::GlobalKey => self.injector.send_global_key(direction),
        };
        if let Err(err) = result {
            log_warn!(
                "page advance via {:?} failed for {}: {err:#}",
                self.strategy,
                window.label
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::window::WindowBounds;

    fn window(owner: &str) -> WindowDescriptor {
        WindowDescriptor::new(
            1,
            owner.into(),
            "Some Book".into(),
            WindowBounds {
                x: 0.0,
                y: 0.0,
                width: 1000.0,
                height: 800.0,
            },
        )
    }

    #[derive(Default)]
    struct CountingInjector {
        browser: AtomicUsize,
        process: AtomicUsize,
        global: AtomicUsize,
        fail: bool,
    }

    impl InputInjector for CountingInjector {
        fn send_browser_key(&self, _: &WindowDescriptor, _: Direction) -> Result<()> {
            self.browser.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                bail!("injector down");
            }
            Ok(())
        }

        fn send_process_key(&self, _: &str, _: Direction) -> Result<()> {
            self.process.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn send_global_key(&self, _: Direction) -> Result<()> {
            self.global.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn activate(&self, _: &WindowDescriptor) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn browser_owners_pick_browser_script() {
        for owner in ["Google Chrome", "Brave Browser", "Microsoft Edge", "Chromium"] {
            assert_eq!(
                AdvanceStrategy::for_window(&window(owner)),
                AdvanceStrategy::BrowserScript,
                "owner {owner}"
            );
        }
    }

    #[test]
    fn named_processes_pick_process_key() {
        assert_eq!(
            AdvanceStrategy::for_window(&window("Kindle")),
            AdvanceStrategy::ProcessKey
        );
        // Non-Chromium browsers have no scriptable surface we target.
        assert_eq!(
            AdvanceStrategy::for_window(&window("Safari")),
            AdvanceStrategy::ProcessKey
        );
    }

    #[test]
    fn unnamed_owner_falls_back_to_global_key() {
        assert_eq!(
            AdvanceStrategy::for_window(&window("")),
            AdvanceStrategy::GlobalKey
        );
    }

    #[test]
    fn advance_dispatches_per_strategy() {
        let injector = CountingInjector::default();
        let target = window("Kindle");
        let advancer = PageAdvancer::new(&injector, &target);

        advancer.advance(&target, Direction::Forward);

        assert_eq!(injector.process.load(Ordering::SeqCst), 1);
        assert_eq!(injector.browser.load(Ordering::SeqCst), 0);
        assert_eq!(injector.global.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn advance_swallows_injector_errors() {
        let injector = CountingInjector {
            fail: true,
            ..Default::default()
        };
        let target = window("Google Chrome");
        let advancer = PageAdvancer::new(&injector, &target);

        // Must not panic or propagate.
        advancer.advance(&target, Direction::Backward);
        assert_eq!(injector.browser.load(Ordering::SeqCst), 1);
    }
}
