use std::fmt::{Debug, Formatter};
use std::io;

/// Fixed-size probabilistic set membership structure over a bit array.
///
/// Three hash families (FNV-1a, Jenkins one-at-a-time, Murmur3) map a byte
/// window to three bit positions; [`insert`][BloomFilter::insert] sets them,
/// [`lookup`][BloomFilter::lookup] tests them all. Bits are never cleared, so
/// false negatives are impossible; false positives occur at a rate bounded by
/// the array size versus the insertion count. There is no removal and the
/// capacity is fixed at construction.
pub struct BloomFilter {
    bits: Vec<u8>,
    num_bits: u64,
}

impl BloomFilter {
    /// Capacity used when the caller has no better estimate.
    pub const DEFAULT_ENTRIES: usize = 10_000;

    /// Allocates a filter sized for `entries` byte slots, 8 bits per slot.
    ///
    /// Fails with [`InvalidInput`][io::ErrorKind::InvalidInput] for a zero
    /// capacity and [`OutOfMemory`][io::ErrorKind::OutOfMemory] when the bit
    /// array cannot be allocated.
    pub fn new(entries: usize) -> io::Result<Self> {
        if entries == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "bloom filter capacity must be at least 1 entry",
            ));
        }

        let mut bits = Vec::new();
        bits.try_reserve_exact(entries).map_err(|_| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                "bloom filter bit array allocation failed",
            )
        })?;
        bits.resize(entries, 0);

        Ok(Self {
            bits,
            num_bits: 8 * entries as u64,
        })
    }

    pub fn with_default_entries() -> io::Result<Self> {
        Self::new(Self::DEFAULT_ENTRIES)
    }

    /// Sets the three bits `window` maps to. Always succeeds; inserting the
    /// same window twice is a no-op.
    pub fn insert(&mut self, window: &[u8]) {
        for hash in [fnv1a(window), jenkins(window), murmur3(window)] {
            let bit = hash % self.num_bits;
            self.bits[(bit / 8) as usize] |= 1 << (bit % 8);
        }
    }

    /// True only if all three bits for `window` are set. Each of the three
    /// single-hash tests must pass; the first unset bit short-circuits.
    pub fn lookup(&self, window: &[u8]) -> bool {
        self.bit_is_set(fnv1a(window))
            && self.bit_is_set(jenkins(window))
            && self.bit_is_set(murmur3(window))
    }

    fn bit_is_set(&self, hash: u64) -> bool {
        let bit = hash % self.num_bits;
        self.bits[(bit / 8) as usize] & (1 << (bit % 8)) != 0
    }
}

impl Debug for BloomFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "BloomFilter, {} bits", self.num_bits)
    }
}

/// FNV-1a, 64-bit.
fn fnv1a(data: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x100_0000_01b3;

    data.iter().fold(OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

/// Jenkins one-at-a-time over a 64-bit accumulator.
fn jenkins(data: &[u8]) -> u64 {
    let mut hash = 0u64;
    for &byte in data {
        hash = hash.wrapping_add(u64::from(byte));
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

/// Murmur3 32-bit, widened to u64 for the common bit-index interface.
fn murmur3(data: &[u8]) -> u64 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;
    const SEED: u32 = 0x9747_b28c;

    let mut hash = SEED;
    let mut blocks = data.chunks_exact(4);
    for block in blocks.by_ref() {
        let mut k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
        k = k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        hash ^= k;
        hash = hash.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let mut k = 0u32;
        for (i, &byte) in tail.iter().enumerate() {
            k ^= u32::from(byte) << (8 * i);
        }
        k = k.wrapping_mul(C1).rotate_left(15).wrapping_mul(C2);
        hash ^= k;
    }

    hash ^= data.len() as u32;
    hash ^= hash >> 16;
    hash = hash.wrapping_mul(0x85eb_ca6b);
    hash ^= hash >> 13;
    hash = hash.wrapping_mul(0xc2b2_ae35);
    hash ^= hash >> 16;
    u64::from(hash)
}
