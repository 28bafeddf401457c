use std::io::Cursor;

use criterion::{Criterion, Throughput};

use fbc_chunkers::chunkers::TttdChunker;
use fbc_chunkers::fingerprint::Sha1Fingerprinter;

const STREAM_SIZE: usize = 64 * 1024;

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

pub fn bench(c: &mut Criterion) {
    let data = xorshift_bytes(0x2545_F491_4F6C_DD1D, STREAM_SIZE);

    let mut group = c.benchmark_group("TttdChunker");
    group.sample_size(10);
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("reference-config", |b| {
        b.iter(|| {
            let mut chunker =
                TttdChunker::new(460, 2800, 540, 270, 1, 1600, Sha1Fingerprinter::default())
                    .unwrap();
            chunker.chunk_stream(&mut Cursor::new(&data)).unwrap()
        })
    });

    group.finish();
}

pub fn benches() {
    let mut criterion: Criterion<_> = Criterion::default().configure_from_args();
    bench(&mut criterion);
}

fn main() {
    benches();

    Criterion::default().configure_from_args().final_summary();
}
