extern crate fbc_chunkers;

use std::fs::File;
use std::io::{BufReader, Cursor, Write};

use rand::rngs::StdRng;
use rand::SeedableRng;

use fbc_chunkers::chunkers::{FbcChunker, TttdChunker};
use fbc_chunkers::fingerprint::{Fingerprinter, Sha1Fingerprinter};
use fbc_chunkers::Chunk;

/// xorshift64; reproducible pseudo-random test data.
fn xorshift_bytes(mut state: u64, count: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        out.push(state as u8);
    }
    out
}

fn reference_chunker() -> TttdChunker<Sha1Fingerprinter> {
    TttdChunker::new(460, 2800, 540, 270, 1, 1600, Sha1Fingerprinter::default()).unwrap()
}

#[test]
fn coarse_chunking_covers_the_stream_exactly() {
    let data = xorshift_bytes(0x2545_F491_4F6C_DD1D, 10_000);
    let chunks = reference_chunker()
        .chunk_stream(&mut Cursor::new(&data))
        .unwrap();

    assert_eq!(chunks.iter().map(Chunk::len).sum::<usize>(), 10_000);

    let mut offset = 0;
    let mut fingerprinter = Sha1Fingerprinter::default();
    for chunk in &chunks {
        assert_eq!(chunk.data(), &data[offset..offset + chunk.len()]);
        assert_eq!(chunk.fingerprint(), fingerprinter.fingerprint(chunk.data()));
        assert!(chunk.len() <= 2800);
        offset += chunk.len();
    }
    assert_eq!(offset, data.len());
}

#[test]
fn two_stage_pipeline_runs_end_to_end() {
    let data = xorshift_bytes(0xDEAD_BEEF_CAFE_F00D, 10_000);
    let chunks = reference_chunker()
        .chunk_stream(&mut Cursor::new(&data))
        .unwrap();

    let mut fbc = FbcChunker::with_rng(
        2000,
        500,
        32,
        Sha1Fingerprinter::default(),
        StdRng::seed_from_u64(11),
    )
    .unwrap();
    for chunk in &chunks {
        fbc.split_big_chunk(chunk);
    }

    // Pseudo-random data carries little internal repetition, so the table may
    // well stay empty; whatever is in it must obey the estimate floor and the
    // window bounds.
    let table = fbc.into_frequency_table();
    for (candidate, count) in table.iter() {
        assert!(count >= 6);
        assert!(candidate.len() >= 500 && candidate.len() <= 2000);
    }
}

#[test]
fn repeated_literal_is_reported_as_frequent() {
    // 50 bytes, digest ≡ 1 mod 2, so every aligned occurrence passes the
    // prefilter at sample rate 2.
    let pattern = b"this exact fifty byte sentence repeats ten times!!";
    assert_eq!(pattern.len(), 50);

    let mut fingerprinter = Sha1Fingerprinter::default();
    assert_eq!(fingerprinter.fingerprint(pattern).modulo(2), 1);

    let coarse = Chunk::new(pattern.repeat(10), &mut fingerprinter);
    let mut fbc = FbcChunker::with_rng(
        50,
        4,
        2,
        Sha1Fingerprinter::default(),
        StdRng::seed_from_u64(7),
    )
    .unwrap();
    fbc.split_big_chunk(&coarse);

    let table = fbc.into_frequency_table();
    assert!(!table.is_empty());
    for (candidate, count) in table.iter() {
        assert!(count >= 6);
        assert!(candidate.len() >= 4 && candidate.len() <= 50);
        let found = coarse
            .data()
            .windows(candidate.len())
            .any(|window| window == candidate.data());
        assert!(found, "candidate is not a sub-window of the coarse chunk");
    }
}

#[test]
fn heavily_repeated_literal_lands_in_the_table_itself() {
    let pattern = b"this exact fifty byte sentence repeats ten times!!";
    let mut fingerprinter = Sha1Fingerprinter::default();

    let coarse = Chunk::new(pattern.repeat(64), &mut fingerprinter);
    let mut fbc = FbcChunker::with_rng(
        50,
        50,
        2,
        Sha1Fingerprinter::default(),
        StdRng::seed_from_u64(7),
    )
    .unwrap();
    fbc.split_big_chunk(&coarse);

    // 64 occurrences of the aligned window leave the three filters covered
    // long before the sightings run out.
    let literal = Chunk::new(pattern.to_vec(), &mut fingerprinter);
    let count = fbc.frequency_table().count(&literal);
    assert!(count >= Some(6), "literal count: {count:?}");
}

#[test]
fn file_backed_stream_chunks_like_a_cursor() {
    let data = xorshift_bytes(0x0123_4567_89AB_CDEF, 6000);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    let opened = File::open(file.path()).unwrap();
    let from_file = reference_chunker()
        .chunk_stream(&mut BufReader::new(opened))
        .unwrap();
    let from_cursor = reference_chunker()
        .chunk_stream(&mut Cursor::new(&data))
        .unwrap();

    assert_eq!(from_file, from_cursor);
    assert_eq!(from_file.iter().map(Chunk::len).sum::<usize>(), data.len());
}
