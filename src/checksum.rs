//! Streaming content digests for written and read file data
//!
//! Write and read operations digest their data chunk-by-chunk, in lockstep
//! with the file I/O, so a write and a subsequent read of the same file
//! produce comparable fingerprints. Deletions have no content and carry the
//! fixed [`NO_CHECKSUM`] placeholder instead.

use sha2::{Digest, Sha256};

/// Placeholder checksum for operations that have no content to digest.
pub const NO_CHECKSUM: &str = "-";

/// Accumulates a content digest over a sequence of byte chunks.
pub struct Checksum {
    digest: Sha256,
}

impl Checksum {
    /// Create a fresh accumulator.
    pub fn new() -> Self {
        Self {
            digest: Sha256::new(),
        }
    }

    /// Feed one chunk of content into the digest.
    pub fn update(&mut self, chunk: &[u8]) {
        self.digest.update(chunk);
    }

    /// Finish the digest and render it as a lower-case hex string.
    pub fn finish(self) -> String {
        hex::encode(self.digest.finalize())
    }
}

impl Default for Checksum {
    fn default() -> Self {
        Self::new()
    }
}
