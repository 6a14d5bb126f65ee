//! Parser benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tinyterm::parser::Parser;

fn bench_parse(c: &mut Criterion, name: &str, input: &[u8]) {
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function(name, |b| {
        b.iter(|| {
            let mut parser = Parser::new();
            black_box(parser.parse(black_box(input)))
        })
    });

    group.finish();
}

fn bench_parse_plain_text(c: &mut Criterion) {
    bench_parse(c, "plain_text", "Hello, World! ".repeat(1000).as_bytes());
}

fn bench_parse_csi_sequences(c: &mut Criterion) {
    let input = "\x1b[1;31mRed\x1b[0m \x1b[5;10H\x1b[2J".repeat(100);
    bench_parse(c, "csi_sequences", input.as_bytes());
}

fn bench_parse_mixed(c: &mut Criterion) {
    // Roughly what `ls --color` produces
    let input = "\x1b[0m\x1b[01;34mdir\x1b[0m  file.txt  \x1b[01;32mscript.sh\x1b[0m\r\n".repeat(200);
    bench_parse(c, "mixed", input.as_bytes());
}

fn bench_parse_utf8(c: &mut Criterion) {
    let input = "日本語テキスト héllo wörld 🎉 ".repeat(200);
    bench_parse(c, "utf8", input.as_bytes());
}

fn bench_parse_byte_at_a_time(c: &mut Criterion) {
    let input = "\x1b]0;title\x07\x1b[38;2;255;128;0mcolor\x1b[0m\r\n".repeat(100);
    let mut group = c.benchmark_group("parser");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("byte_at_a_time", |b| {
        b.iter(|| {
            let mut parser = Parser::new();
            let mut ops = Vec::new();
            for &byte in input.as_bytes() {
                parser.advance(black_box(byte), &mut ops);
            }
            black_box(ops)
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_parse_plain_text,
    bench_parse_csi_sequences,
    bench_parse_mixed,
    bench_parse_utf8,
    bench_parse_byte_at_a_time
);
criterion_main!(benches);
