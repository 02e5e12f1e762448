//! Content fingerprints for duplicate-frame detection.
//!
//! The fingerprint is a SHA-256 digest over the raw encoded bytes of the
//! stored image. Two successive pages hashing identically is the only signal
//! that a page-turn command had no effect, so the hash must be strong enough
//! that a collision between different renders is not a practical concern.
//! Crop insets are applied before fingerprinting; otherwise UI chrome that
//! differs between renders would mask a genuinely unchanged page.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

pub fn fingerprint_file(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path)
        .with_context(|| format!("reading {} for fingerprinting", path.display()))?;
    Ok(Sha256::digest(&bytes).to_vec())
}
