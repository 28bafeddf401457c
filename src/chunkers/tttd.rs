use std::fmt::{Debug, Formatter};
use std::io;
use std::io::Read;

use crate::chunkers::config_error;
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::Chunk;

/// Chunker that utilizes the TTTD-s algorithm: two thresholds, two divisors,
/// with adaptive divisor switching.
///
/// A working window grows from the stream in `step_size` increments; after
/// each step the fingerprint of the whole window is tested against the
/// secondary divisor (backup break point) and the primary divisor (break
/// point). Past `switch_threshold` both divisors are halved, once per chunk,
/// which raises the break probability in an oversized window and biases
/// toward shorter tails. Windows that hit `t_max` without a primary break are
/// cut at the most recent backup point when one exists, with the tail carried
/// over into the next window.
///
/// The fingerprint is recomputed over the entire window on every step, so the
/// scan is quadratic in window size. This is the hot path; a rolling hash is
/// deliberately not substituted because any hash that is not bit-identical
/// changes which byte sequences trigger a boundary.
///
/// Source: Moh, Chang: "A running time improvement for the two thresholds
/// two divisors algorithm" (ACM SE '10), building on Eshghi, Tang: "A
/// Framework for Analyzing and Improving Content-Based Chunking Algorithms"
/// (HP Labs TR 2005-30R1).
pub struct TttdChunker<F> {
    t_min: usize,
    t_max: usize,
    primary_divisor: u64,
    secondary_divisor: u64,
    step_size: usize,
    switch_threshold: usize,
    switched: bool,
    fingerprinter: F,
}

impl<F: Fingerprinter> TttdChunker<F> {
    /// Creates a TTTD-s chunker.
    ///
    /// Both divisors must be even and nonzero, since the switching step
    /// halves them in place. Sizes must satisfy `1 <= t_min <= t_max` and
    /// `step_size >= 1`. Violations are reported as
    /// [`InvalidInput`][io::ErrorKind::InvalidInput] so the caller can
    /// reconfigure and retry.
    pub fn new(
        t_min: usize,
        t_max: usize,
        primary_divisor: u64,
        secondary_divisor: u64,
        step_size: usize,
        switch_threshold: usize,
        fingerprinter: F,
    ) -> io::Result<Self> {
        if primary_divisor == 0 || primary_divisor % 2 != 0 {
            return Err(config_error("primary divisor must be even and nonzero"));
        }
        if secondary_divisor == 0 || secondary_divisor % 2 != 0 {
            return Err(config_error("secondary divisor must be even and nonzero"));
        }
        if t_min == 0 {
            return Err(config_error("minimum chunk size must be at least 1"));
        }
        if t_min > t_max {
            return Err(config_error(
                "minimum chunk size must not exceed maximum chunk size",
            ));
        }
        if step_size == 0 {
            return Err(config_error("step size must be at least 1"));
        }

        Ok(Self {
            t_min,
            t_max,
            primary_divisor,
            secondary_divisor,
            step_size,
            switch_threshold,
            switched: false,
            fingerprinter,
        })
    }

    /// Splits the whole stream into content-defined chunks, in stream order.
    ///
    /// Reads `t_min` bytes to seed each window, then `step_size` bytes per
    /// scan step. A residual window at end-of-stream is emitted as a final
    /// chunk even when it satisfies no break criterion, so the concatenation
    /// of the returned chunks always equals the consumed stream. Only the
    /// final chunk may be shorter than `t_min`.
    ///
    /// A read error aborts the call with that error; the partial window is
    /// discarded, not emitted. Divisor state is restored on return, so the
    /// chunker can be reused for further streams.
    pub fn chunk_stream<R: Read>(&mut self, input: &mut R) -> io::Result<Vec<Chunk>> {
        let mut window = Vec::new();
        window.try_reserve_exact(self.t_max).map_err(|_| {
            io::Error::new(
                io::ErrorKind::OutOfMemory,
                "chunk window buffer allocation failed",
            )
        })?;

        let mut chunks = Vec::new();
        let mut backup_length = 0;
        let mut backup_fingerprint = Fingerprint::default();

        loop {
            let want = if window.is_empty() {
                self.t_min
            } else {
                self.step_size
            };
            let want = want.min(self.t_max - window.len());
            if read_into(input, &mut window, want)? == 0 {
                break;
            }

            let fingerprint = self.fingerprinter.fingerprint(&window);

            if window.len() > self.switch_threshold && !self.switched {
                self.switch_divisors();
            }

            if self.is_backup_point(fingerprint) {
                backup_length = window.len();
                backup_fingerprint = fingerprint;
            }

            if self.is_break_point(fingerprint) {
                chunks.push(Chunk::from_parts(window.drain(..).collect(), fingerprint));
                backup_length = 0;
                self.restore_divisors();
                continue;
            }

            if window.len() >= self.t_max {
                if backup_length != 0 {
                    // Cut at the backup point; the tail stays in the window
                    // and becomes the start of the next chunk.
                    let data = window.drain(..backup_length).collect();
                    chunks.push(Chunk::from_parts(data, backup_fingerprint));
                    backup_length = 0;
                } else {
                    chunks.push(Chunk::from_parts(window.drain(..).collect(), fingerprint));
                }
                self.restore_divisors();
            }
        }

        if !window.is_empty() {
            let fingerprint = self.fingerprinter.fingerprint(&window);
            chunks.push(Chunk::from_parts(window, fingerprint));
        }
        self.restore_divisors();

        Ok(chunks)
    }

    fn is_break_point(&self, fingerprint: Fingerprint) -> bool {
        fingerprint.modulo(self.primary_divisor) == self.primary_divisor - 1
    }

    fn is_backup_point(&self, fingerprint: Fingerprint) -> bool {
        fingerprint.modulo(self.secondary_divisor) == self.secondary_divisor - 1
    }

    fn switch_divisors(&mut self) {
        self.primary_divisor /= 2;
        self.secondary_divisor /= 2;
        self.switched = true;
    }

    fn restore_divisors(&mut self) {
        if self.switched {
            self.primary_divisor *= 2;
            self.secondary_divisor *= 2;
            self.switched = false;
        }
    }
}

impl<F> Debug for TttdChunker<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TTTD-s, sizes: [{}, {}], divisors: [{}, {}], step: {}, switch past: {}",
            self.t_min,
            self.t_max,
            self.primary_divisor,
            self.secondary_divisor,
            self.step_size,
            self.switch_threshold
        )
    }
}

/// Appends up to `want` bytes from `input` to `buf`, re-issuing interrupted
/// reads. Returns the number of bytes appended; less than `want` happens only
/// at end of stream.
fn read_into<R: Read>(input: &mut R, buf: &mut Vec<u8>, want: usize) -> io::Result<usize> {
    let start = buf.len();
    buf.resize(start + want, 0);

    let mut filled = 0;
    while filled < want {
        match input.read(&mut buf[start + filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(start + filled);
    Ok(filled)
}
