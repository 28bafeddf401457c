use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::io;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bloom::BloomFilter;
use crate::chunkers::config_error;
use crate::fingerprint::Fingerprinter;
use crate::Chunk;

/// Per the FBC paper, three filters work best in practice; the algorithm's
/// occurrence estimate below is calibrated to this count.
const FILTER_COUNT: usize = 3;

/// Expected occurrences of a window before random single-filter insertion has
/// covered all three filters is ~5.5 (coupon collector), so a window that
/// first clears all three has very likely been seen about six times already.
const INITIAL_COUNT: u32 = 6;

/// Accumulator mapping recurring sub-chunk content to an approximate
/// occurrence count.
///
/// The first sighting of a candidate that clears all three bloom filters
/// seeds its count at 6; later sightings of equal content increment it.
/// Counts are estimates, not exact tallies. Entries are never removed here;
/// retention and export are the caller's concern.
#[derive(Debug, Default)]
pub struct FrequencyTable {
    counts: HashMap<Chunk, u32>,
}

impl FrequencyTable {
    fn record(&mut self, candidate: Chunk) {
        self.counts
            .entry(candidate)
            .and_modify(|count| *count += 1)
            .or_insert(INITIAL_COUNT);
    }

    /// Approximate occurrence count for content equal to `chunk`.
    pub fn count(&self, chunk: &Chunk) -> Option<u32> {
        self.counts.get(chunk).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Chunk, u32)> {
        self.counts.iter().map(|(chunk, &count)| (chunk, count))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Chunker that utilizes the FBC (frequency-based chunking) algorithm to
/// discover sub-chunks of a coarse chunk that recur at least three times.
///
/// Oversized chunks are rescanned with windows shrinking from `t_max` by
/// halving down to `t_min`. Each window is sampled by a fingerprint prefilter
/// (`fingerprint mod sample_rate == 1`), then tested against three bloom
/// filters. A window present in all three is counted in the frequency table;
/// otherwise it is inserted into one filter chosen at random, which is what
/// lets the all-three test approximate "seen at least three times" without
/// storing every candidate.
///
/// The random filter choice makes exact counts run-dependent; only the
/// "appears frequent" classification converges as occurrences grow. The
/// filters and the table are shared across every chunk this instance scans,
/// so subdividing chunks concurrently requires funneling updates through one
/// owner.
///
/// Source: Lu, Jin, Du: "Frequency Based Chunking for Data De-Duplication"
/// (MASCOTS 2010).
pub struct FbcChunker<F, R = StdRng> {
    filters: [BloomFilter; FILTER_COUNT],
    freq_table: FrequencyTable,
    t_max: usize,
    t_min: usize,
    sample_rate: u64,
    fingerprinter: F,
    rng: R,
}

impl<F: Fingerprinter> FbcChunker<F> {
    /// Creates an FBC chunker with an OS-seeded generator for the filter
    /// choice.
    pub fn new(t_max: usize, t_min: usize, sample_rate: u64, fingerprinter: F) -> io::Result<Self> {
        Self::with_rng(t_max, t_min, sample_rate, fingerprinter, StdRng::from_os_rng())
    }
}

impl<F: Fingerprinter, R: Rng> FbcChunker<F, R> {
    /// Creates an FBC chunker with an explicit generator, which makes the
    /// randomized filter choice reproducible.
    ///
    /// `sample_rate` must be at least 2: the prefilter keeps windows whose
    /// fingerprint is ≡ 1 modulo the rate, and nothing is ≡ 1 modulo 1.
    pub fn with_rng(
        t_max: usize,
        t_min: usize,
        sample_rate: u64,
        fingerprinter: F,
        rng: R,
    ) -> io::Result<Self> {
        if t_min == 0 {
            return Err(config_error("minimum window size must be at least 1"));
        }
        if t_min > t_max {
            return Err(config_error(
                "minimum window size must not exceed maximum window size",
            ));
        }
        if sample_rate < 2 {
            return Err(config_error("sample rate must be at least 2"));
        }

        Ok(Self {
            filters: [
                BloomFilter::with_default_entries()?,
                BloomFilter::with_default_entries()?,
                BloomFilter::with_default_entries()?,
            ],
            freq_table: FrequencyTable::default(),
            t_max,
            t_min,
            sample_rate,
            fingerprinter,
            rng,
        })
    }

    /// Rescans one coarse chunk for recurring sub-windows, folding findings
    /// into the shared frequency table.
    ///
    /// No boundary is cut here; promoting frequent sub-chunks into an actual
    /// re-chunking decision is left to the caller.
    pub fn split_big_chunk(&mut self, chunk: &Chunk) {
        let data = chunk.data();

        let mut window_size = self.t_max;
        while window_size >= self.t_min {
            if window_size <= data.len() {
                for position in 0..=data.len() - window_size {
                    let window = &data[position..position + window_size];
                    let fingerprint = self.fingerprinter.fingerprint(window);
                    if fingerprint.modulo(self.sample_rate) != 1 {
                        continue;
                    }

                    if self.filters.iter().all(|filter| filter.lookup(window)) {
                        self.freq_table
                            .record(Chunk::from_parts(window.to_vec(), fingerprint));
                    } else {
                        self.insert_candidate(window);
                    }
                }
            }
            window_size /= 2;
        }
    }

    /// Inserts the window into exactly one of the three filters, chosen
    /// uniformly.
    fn insert_candidate(&mut self, window: &[u8]) {
        let chosen = self.rng.random_range(0..FILTER_COUNT);
        self.filters[chosen].insert(window);
    }

    pub fn frequency_table(&self) -> &FrequencyTable {
        &self.freq_table
    }

    pub fn into_frequency_table(self) -> FrequencyTable {
        self.freq_table
    }
}

impl<F, R> Debug for FbcChunker<F, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FBC, windows: [{}, {}], sample rate: {}, {} frequent candidates",
            self.t_min,
            self.t_max,
            self.sample_rate,
            self.freq_table.len()
        )
    }
}
