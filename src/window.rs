//! Target window descriptors and the enumeration seam.

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Immutable snapshot of one on-screen window, taken at enumeration time.
/// Identity is `id`; everything else is display metadata and strategy input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowDescriptor {
    pub id: u32,
    pub owner_name: String,
    pub title: String,
    pub bounds: WindowBounds,
    /// Human-readable `"owner — title"` string shown in window pickers.
    pub label: String,
}

impl WindowDescriptor {
    pub fn new(id: u32, owner_name: String, title: String, bounds: WindowBounds) -> Self {
        let label = Self::label_for(&owner_name, &title);
        Self {
            id,
            owner_name,
            title,
            bounds,
            label,
        }
    }

    pub fn label_for(owner: &str, title: &str) -> String {
        if title.is_empty() {
            owner.to_string()
        } else {
            format!("{owner} — {title}")
        }
    }
}

/// External collaborator that enumerates candidate capture targets.
pub trait WindowLocator: Send + Sync {
    fn list_windows(&self) -> Result<Vec<WindowDescriptor>>;
}
