use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Iteration bound used when no page count is configured; in that mode the
/// loop runs until the duplicate-frame auto-stop fires.
pub const UNBOUNDED_PAGE_LIMIT: u32 = 9999;

/// Reading direction of the target book. Determines which arrow key the
/// advancer sends; always configured explicitly, never inferred from content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    /// Left arrow, for vertical / right-to-left books (e.g. Japanese).
    Backward,
    /// Right arrow, for left-to-right books.
    Forward,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Backward
    }
}

/// Pixel insets stripped from every captured frame before fingerprinting,
/// used to cut browser chrome out of the comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropInsets {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl CropInsets {
    pub fn is_zero(&self) -> bool {
        self.top == 0 && self.bottom == 0 && self.left == 0 && self.right == 0
    }
}

/// Settings for one capture job. Immutable for the job's duration.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// `None` = run until the duplicate-frame auto-stop.
    pub max_pages: Option<u32>,
    pub direction: Direction,
    /// Settling delay after each page turn, before the next capture. A
    /// constant wait for the reader to finish rendering, not a backoff.
    pub delay: Duration,
    pub crop: CropInsets,
}

impl CaptureConfig {
    pub fn is_bounded(&self) -> bool {
        self.max_pages.is_some()
    }

    pub fn effective_limit(&self) -> u32 {
        self.max_pages.unwrap_or(UNBOUNDED_PAGE_LIMIT)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_pages: None,
            direction: Direction::default(),
            delay: Duration::from_millis(1500),
            crop: CropInsets::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_config_uses_sentinel_limit() {
        let config = CaptureConfig::default();
        assert!(!config.is_bounded());
        assert_eq!(config.effective_limit(), UNBOUNDED_PAGE_LIMIT);
    }

    #[test]
    fn bounded_config_uses_max_pages() {
        let config = CaptureConfig {
            max_pages: Some(12),
            ..Default::default()
        };
        assert!(config.is_bounded());
        assert_eq!(config.effective_limit(), 12);
    }
}
