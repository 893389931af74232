//! Content hashing for change detection and payload integrity checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Read};

/// A 128-bit XXH3 digest of some content.
///
/// Equal hashes are taken to mean equal content. Source snapshots use it to
/// spot modified files between builds; serialized work payloads carry one
/// to detect corruption in transit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Hashes an in-memory buffer.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(xxhash_rust::xxh3::xxh3_128(data).to_le_bytes())
    }

    /// Hashes everything `reader` yields without buffering it whole.
    ///
    /// Produces the same hash as [`ContentHash::from_bytes`] over the same
    /// content.
    pub fn from_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut hasher = xxhash_rust::xxh3::Xxh3::new();
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => hasher.update(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Self(hasher.digest128().to_le_bytes()))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|byte| write!(f, "{byte:02x}"))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}
