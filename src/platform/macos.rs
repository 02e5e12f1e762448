//! macOS collaborators: `screencapture` for pixel grabs and `osascript`
//! for key injection and activation.
//!
//! `screencapture -l <id>` captures a single window by CGWindowID without
//! disturbing focus. Key injection has three shapes matching the advance
//! strategies: JavaScript dispatched into a Chromium tab, a System Events
//! key code scoped to a named process, and a global key code.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::advance::{AdvanceStrategy, InputInjector};
use crate::capture::config::Direction;
use crate::capture::loop_worker::FrameGrabber;
use crate::window::WindowDescriptor;

const ENABLE_LOGS: bool = true;
use crate::log_info;

/// macOS virtual key codes for the arrow keys.
fn key_code(direction: Direction) -> u8 {
    match direction {
        Direction::Backward => 123,
        Direction::Forward => 124,
    }
}

fn arrow_js_key(direction: Direction) -> &'static str {
    match direction {
        Direction::Backward => "ArrowLeft",
        Direction::Forward => "ArrowRight",
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn run_osascript(script: &str) -> Result<()> {
    let output = Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .context("spawning osascript")?;
    if !output.status.success() {
        bail!(
            "osascript failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(())
}

pub struct ScreencaptureGrabber;

impl FrameGrabber for ScreencaptureGrabber {
    fn capture(&self, window: &WindowDescriptor, output: &Path) -> Result<()> {
        // -x no sound, -o no window shadow, -l capture by window id.
        let status = Command::new("screencapture")
            .arg("-x")
            .arg("-o")
            .arg("-l")
            .arg(window.id.to_string())
            .arg(output)
            .status()
            .context("spawning screencapture")?;
        if !status.success() {
            bail!(
                "screencapture exited with {status} for window {} ({})",
                window.id,
                window.label
            );
        }
        if !output.exists() {
            bail!(
                "screencapture produced no file for window {}, it may have closed",
                window.id
            );
        }
        Ok(())
    }
}

pub struct OsascriptInjector;

impl InputInjector for OsascriptInjector {
    fn send_browser_key(&self, window: &WindowDescriptor, direction: Direction) -> Result<()> {
        // Dispatch a synthetic KeyboardEvent inside the tab whose title
        // matches the window, so the page's own key handler turns the page
        // even if another tab is frontmost.
        let script = format!(
            r#"tell application "{app}"
    repeat with w in windows
        repeat with t in tabs of w
            if title of t contains "{title}" then
                tell t to execute javascript "document.dispatchEvent(new KeyboardEvent('keydown', {{key: '{key}', code: '{key}', bubbles: true}}));"
                return
            end if
        end repeat
    end repeat
end tell"#,
            app = escape_applescript(&window.owner_name),
            title = escape_applescript(&window.title),
            key = arrow_js_key(direction),
        );
        run_osascript(&script)
    }

    fn send_process_key(&self, process_name: &str, direction: Direction) -> Result<()> {
        // System Events delivers key codes to the frontmost app only, so
        // the target is raised first.
        let script = format!(
            r#"tell application "System Events"
    tell process "{process}"
        set frontmost to true
    end tell
    key code {code}
end tell"#,
            process = escape_applescript(process_name),
            code = key_code(direction),
        );
        run_osascript(&script)
    }

    fn send_global_key(&self, direction: Direction) -> Result<()> {
        run_osascript(&format!(
            r#"tell application "System Events" to key code {}"#,
            key_code(direction)
        ))
    }

    fn activate(&self, window: &WindowDescriptor) -> Result<()> {
        log_info!("activating {}", window.label);
        let script = match AdvanceStrategy::for_window(window) {
            // Bringing a browser frontmost is not enough: the book may sit
            // in a background tab, and every capture would then show the
            // active tab instead. Search the tabs by title and raise the
            // matching one.
            AdvanceStrategy::BrowserScript => {
                browser_activation_script(&window.owner_name, &window.title)
            }
            _ => app_activation_script(&window.owner_name),
        };
        run_osascript(&script)
    }
}

fn app_activation_script(app: &str) -> String {
    format!(
        r#"tell application "{app}" to activate"#,
        app = escape_applescript(app)
    )
}

fn browser_activation_script(app: &str, title: &str) -> String {
    format!(
        r#"tell application "{app}"
    activate
    set windowIndex to 0
    repeat with w in windows
        set windowIndex to windowIndex + 1
        set tabIndex to 0
        repeat with t in tabs of w
            set tabIndex to tabIndex + 1
            if title of t contains "{title}" then
                set active tab index of w to tabIndex
                set index of w to 1
                return
            end if
        end repeat
    end repeat
end tell"#,
        app = escape_applescript(app),
        title = escape_applescript(title),
    )
}
