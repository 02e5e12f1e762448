//! Window enumeration via `xcap`. On macOS the window id xcap reports is
//! the CGWindowID that `screencapture -l` expects, so descriptors from here
//! feed the grabber directly.

use anyhow::{Context, Result};
use xcap::Window;

use crate::window::{WindowBounds, WindowDescriptor, WindowLocator};

const ENABLE_LOGS: bool = false;
use crate::log_warn;

/// Windows smaller than this are chrome fragments (tooltips, status
/// items), not reader surfaces.
const MIN_DIMENSION: u32 = 100;

/// Owners that always enumerate but are never capture targets.
const SYSTEM_OWNERS: &[&str] = &["Window Server", "Dock", "Control Center", "Notification Center"];

pub struct XcapWindowLocator;

impl WindowLocator for XcapWindowLocator {
    fn list_windows(&self) -> Result<Vec<WindowDescriptor>> {
        let windows = Window::all().context("enumerating windows")?;
        let mut descriptors = Vec::new();

        for window in windows {
            let snapshot = (|| -> xcap::XCapResult<Option<WindowDescriptor>> {
                if window.is_minimized()? {
                    return Ok(None);
                }
                let owner = window.app_name()?;
                let width = window.width()?;
                let height = window.height()?;
                if !is_capturable(&owner, width, height) {
                    return Ok(None);
                }
                Ok(Some(WindowDescriptor::new(
                    window.id()?,
                    owner,
                    window.title()?,
                    WindowBounds {
                        x: window.x()? as f64,
                        y: window.y()? as f64,
                        width: width as f64,
                        height: height as f64,
                    },
                )))
            })();

            match snapshot {
                Ok(Some(descriptor)) => descriptors.push(descriptor),
                Ok(None) => {}
                // A window can vanish between enumeration and inspection.
                Err(err) => log_warn!("skipping unreadable window: {err}"),
            }
        }

        Ok(descriptors)
    }
}

fn is_capturable(owner: &str, width: u32, height: u32) -> bool {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return false;
    }
    !SYSTEM_OWNERS.iter().any(|s| s.eq_ignore_ascii_case(owner))
}
