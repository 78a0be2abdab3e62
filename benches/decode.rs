//! Benchmarks for the hot paths around member decoding.
//!
//! Run with: `cargo bench`
//! Compare with baseline: `cargo bench -- --save-baseline main`
//! Compare against baseline: `cargo bench -- --baseline main`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lzip_stream::crc32::crc32;
use lzip_stream::{DecodeOptions, LzipIndex, MemberHeader, MemberTrailer, MemoryMedia};

/// Build a structurally valid member around an opaque body. The index
/// never decodes bodies, so zeros are as good as coded data.
fn synthetic_member(body_len: usize, data_size: u64) -> Vec<u8> {
    let header = MemberHeader::encode(4096).unwrap();
    let member_size = (MemberHeader::SIZE + body_len + MemberTrailer::SIZE) as u64;
    let trailer = MemberTrailer {
        data_crc: if data_size == 0 { 0 } else { 0x1234_5678 },
        data_size,
        member_size,
    };
    let mut member = Vec::with_capacity(member_size as usize);
    member.extend_from_slice(&header);
    member.resize(MemberHeader::SIZE + body_len, 0);
    member.extend_from_slice(&trailer.to_bytes());
    member
}

fn synthetic_file(members: usize) -> Vec<u8> {
    let mut file = Vec::new();
    for i in 0..members {
        file.extend_from_slice(&synthetic_member(1000 + i % 7, 4000));
    }
    file
}

/// Benchmark the slicing-by-8 CRC32 over decoded data
fn bench_crc32(c: &mut Criterion) {
    let data = vec![0xA5u8; 1 << 20];

    let mut group = c.benchmark_group("crc32");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("one_mib", |b| {
        b.iter(|| crc32(black_box(&data)));
    });

    group.finish();
}

/// Benchmark header parsing and trailer consistency filtering
fn bench_parsing(c: &mut Criterion) {
    let header_bytes = MemberHeader::encode(320 * 1024).unwrap();
    c.bench_function("parse_header", |b| {
        b.iter(|| MemberHeader::parse(black_box(&header_bytes)))
    });

    let member = synthetic_member(500, 2000);
    let mut trailer_bytes = [0u8; MemberTrailer::SIZE];
    trailer_bytes.copy_from_slice(&member[member.len() - MemberTrailer::SIZE..]);
    c.bench_function("trailer_consistency", |b| {
        b.iter(|| MemberTrailer::parse(black_box(&trailer_bytes)).check_consistency())
    });
}

/// Benchmark index construction over a multimember file
fn bench_index(c: &mut Criterion) {
    let file = synthetic_file(200);
    let media = MemoryMedia::new(file.clone());

    let mut group = c.benchmark_group("index");
    group.throughput(Throughput::Bytes(file.len() as u64));

    group.bench_function("multimember_200", |b| {
        b.iter(|| LzipIndex::new(black_box(&media), &DecodeOptions::default()))
    });

    // Trailing data forces the backward window scan
    let mut file = synthetic_file(3);
    file.extend_from_slice(&vec![0xEEu8; 48 * 1024]);
    let media = MemoryMedia::new(file);
    group.bench_function("trailing_scan_48k", |b| {
        b.iter(|| LzipIndex::new(black_box(&media), &DecodeOptions::default()))
    });

    group.finish();
}

criterion_group!(benches, bench_crc32, bench_parsing, bench_index);
criterion_main!(benches);
