//! Two-stage content-defined chunking for data deduplication.
//!
//! The first stage, [`TttdChunker`][chunkers::TttdChunker], partitions a byte
//! stream into coarse chunks with the TTTD-s algorithm (two thresholds, two
//! divisors, with divisor switching). The second stage,
//! [`FbcChunker`][chunkers::FbcChunker], rescans each coarse chunk with a
//! family of shrinking sliding windows and uses three bloom filters to find
//! sub-windows that recur often enough to be worth extracting as smaller
//! dedup units.
//!
//! ```
//! use std::io::Cursor;
//!
//! use fbc_chunkers::chunkers::{FbcChunker, TttdChunker};
//! use fbc_chunkers::fingerprint::Sha1Fingerprinter;
//!
//! fn main() -> std::io::Result<()> {
//!     let data = b"some stream contents ".repeat(500);
//!
//!     let mut chunker =
//!         TttdChunker::new(460, 2800, 540, 270, 1, 1600, Sha1Fingerprinter::default())?;
//!     let chunks = chunker.chunk_stream(&mut Cursor::new(&data))?;
//!     assert_eq!(chunks.iter().map(|chunk| chunk.len()).sum::<usize>(), data.len());
//!
//!     let mut fbc = FbcChunker::new(2000, 500, 32, Sha1Fingerprinter::default())?;
//!     for chunk in &chunks {
//!         fbc.split_big_chunk(chunk);
//!     }
//!     let frequent = fbc.into_frequency_table();
//!     for (candidate, count) in frequent.iter() {
//!         println!("{} bytes seen ~{} times", candidate.len(), count);
//!     }
//!     Ok(())
//! }
//! ```

use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};

pub use fingerprint::{Fingerprint, Fingerprinter, Sha1Fingerprinter};

pub mod bloom;
pub mod chunkers;
pub mod fingerprint;

/// A chunk of the processed stream. Owns its bytes and carries the fingerprint
/// that was computed over exactly those bytes when the boundary was decided.
///
/// Chunks compare by content: length first, then fingerprint as a cheap
/// pre-check, then the bytes themselves. Digests admit collisions in
/// principle, so fingerprint equality alone is never trusted.
#[derive(Clone)]
pub struct Chunk {
    data: Vec<u8>,
    fingerprint: Fingerprint,
}

impl Chunk {
    /// Creates a chunk from owned bytes, fingerprinting them on the spot.
    pub fn new<F: Fingerprinter>(data: Vec<u8>, fingerprinter: &mut F) -> Self {
        let fingerprint = fingerprinter.fingerprint(&data);
        Self { data, fingerprint }
    }

    /// For chunkers that already hold the fingerprint of the boundary they
    /// just cut. `fingerprint` must cover exactly `data`.
    pub(crate) fn from_parts(data: Vec<u8>, fingerprint: Fingerprint) -> Self {
        Self { data, fingerprint }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl PartialEq for Chunk {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len()
            && self.fingerprint == other.fingerprint
            && self.data == other.data
    }
}

impl Eq for Chunk {}

impl Hash for Chunk {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.hash(state);
    }
}

impl Debug for Chunk {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Chunk({} bytes, {:?})", self.data.len(), self.fingerprint)
    }
}
