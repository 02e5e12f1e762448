//! Append-only store of captured page frames, backed by sequentially
//! numbered PNG files in one working directory.
//!
//! The store belongs to exactly one job at a time: `reset` purges every frame
//! left by a previous job before the first capture of a new one.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::fingerprint::fingerprint_file;

const FRAME_PREFIX: &str = "page_";
const FRAME_EXTENSION: &str = ".png";

/// One captured page. `index` is the zero-based position in the book slice
/// this job walked through; `fingerprint` is the SHA-256 of the stored bytes.
#[derive(Debug, Clone)]
pub struct PageFrame {
    pub index: u32,
    pub image_path: PathBuf,
    pub fingerprint: Vec<u8>,
}

pub struct FrameStore {
    root: PathBuf,
    frames: Vec<PageFrame>,
}

impl FrameStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            frames: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Prepare the working directory for a new job: drop any in-memory
    /// frames and delete frame files left on disk by an earlier run.
    pub fn reset(&mut self) -> Result<()> {
        self.frames.clear();
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating working directory {}", self.root.display()))?;
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("listing working directory {}", self.root.display()))?
        {
            let path = entry?.path();
            if path.is_file() && parse_frame_index(&path).is_some() {
                fs::remove_file(&path)
                    .with_context(|| format!("removing stale frame {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Path a frame with the given index is stored at: `page_0000.png` etc.
    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.root
            .join(format!("{FRAME_PREFIX}{index:04}{FRAME_EXTENSION}"))
    }

    /// Append a frame. Indices must stay contiguous from zero.
    pub fn push(&mut self, frame: PageFrame) {
        debug_assert_eq!(frame.index as usize, self.frames.len());
        self.frames.push(frame);
    }

    /// Drop the most recent frame, deleting its file. Used to discard the
    /// duplicate that signalled end-of-book.
    pub fn discard_last(&mut self) -> Result<Option<PageFrame>> {
        let Some(frame) = self.frames.pop() else {
            return Ok(None);
        };
        fs::remove_file(&frame.image_path).with_context(|| {
            format!("removing discarded frame {}", frame.image_path.display())
        })?;
        Ok(Some(frame))
    }

    /// Rebuild the frame list from numbered PNGs already on disk, for
    /// OCR-only jobs over a previous capture. Frames are ordered by their
    /// parsed index; files that do not match the naming scheme are ignored.
    pub fn scan_existing(&mut self) -> Result<usize> {
        self.frames.clear();
        if !self.root.is_dir() {
            return Ok(0);
        }

        let mut found: Vec<(u32, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("listing working directory {}", self.root.display()))?
        {
            let path = entry?.path();
            if let Some(index) = parse_frame_index(&path) {
                found.push((index, path));
            }
        }
        found.sort_by_key(|(index, _)| *index);

        for (index, path) in found {
            let fingerprint = fingerprint_file(&path)?;
            self.frames.push(PageFrame {
                index,
                image_path: path,
                fingerprint,
            });
        }
        Ok(self.frames.len())
    }

    pub fn frames(&self) -> &[PageFrame] {
        &self.frames
    }

    pub fn last(&self) -> Option<&PageFrame> {
        self.frames.last()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn parse_frame_index(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    let stem = name
        .strip_prefix(FRAME_PREFIX)?
        .strip_suffix(FRAME_EXTENSION)?;
    stem.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_paths_are_zero_padded() {
        let store = FrameStore::new("/tmp/pages");
        assert_eq!(
            store.frame_path(7),
            PathBuf::from("/tmp/pages/page_0007.png")
        );
        assert_eq!(
            store.frame_path(123),
            PathBuf::from("/tmp/pages/page_0123.png")
        );
    }

    #[test]
    fn reset_purges_stale_frames_but_not_other_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::new(dir.path());
        fs::write(store.frame_path(0), b"old frame").unwrap();
        fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        store.reset().unwrap();

        assert!(!store.frame_path(0).exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(store.is_empty());
    }

    #[test]
    fn discard_last_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::new(dir.path());
        store.reset().unwrap();

        let path = store.frame_path(0);
        fs::write(&path, b"frame").unwrap();
        store.push(PageFrame {
            index: 0,
            image_path: path.clone(),
            fingerprint: vec![1],
        });

        let discarded = store.discard_last().unwrap().unwrap();
        assert_eq!(discarded.index, 0);
        assert!(!path.exists());
        assert!(store.is_empty());
    }

    #[test]
    fn scan_existing_orders_by_index_and_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::new(dir.path());
        fs::write(dir.path().join("page_0002.png"), b"two").unwrap();
        fs::write(dir.path().join("page_0000.png"), b"zero").unwrap();
        fs::write(dir.path().join("page_0001.png"), b"one").unwrap();
        fs::write(dir.path().join("page_0001_inverted.png"), b"variant").unwrap();
        fs::write(dir.path().join("output.txt"), b"text").unwrap();

        let count = store.scan_existing().unwrap();

        assert_eq!(count, 3);
        let indices: Vec<u32> = store.frames().iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn scan_existing_on_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FrameStore::new(dir.path().join("never_created"));
        assert_eq!(store.scan_existing().unwrap(), 0);
    }
}
