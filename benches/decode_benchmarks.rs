// benches/decode_benchmarks.rs
// Decode throughput for synthetic profiler logs: raw varints, a single
// buffer through the expert decoder, and whole streams through the processor
// with and without sorted delivery.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use proflog::tags::*;
use proflog::writer::write_uleb128;
use proflog::{
    BufferDecoder, BufferHeader, EventEncoder, LogEvent, LogEventVisitor, LogProcessor, LogReader,
    LogWriter, StreamHeader,
};
use std::io::Cursor;
use std::sync::Arc;

fn stream_header() -> StreamHeader {
    StreamHeader {
        major_version: 6,
        minor_version: 12,
        format_version: 16,
        pointer_size: 8,
        startup_time: 0,
        timer_overhead: 0,
        flags: 0,
        process_id: 1,
        port: 0,
        arguments: String::new(),
        architecture: "x86_64".into(),
        operating_system: "linux".into(),
    }
}

fn buffer_header(thread_id: i64) -> BufferHeader {
    BufferHeader {
        length: 0,
        time_base: 1_000_000,
        pointer_base: 0x7F00_0000_0000,
        object_base: 0x0200_0000,
        thread_id,
        method_base: 0x5000_0000,
    }
}

/// A buffer shaped like a sampling session: method traffic, allocations
/// with backtraces and periodic samples.
fn typical_buffer(thread_id: i64, events: usize) -> EventEncoder {
    let header = buffer_header(thread_id);
    let (pointer_base, object_base, method_base) =
        (header.pointer_base, header.object_base, header.method_base);
    let mut enc = EventEncoder::new(header);
    let mut now = 1_000_000u64;
    for i in 0..events as i64 {
        now += 3 + (i as u64 % 17);
        let method = method_base + (i % 64) * 0x40;
        match i % 4 {
            0 => {
                enc.event(TYPE_METHOD, METHOD_ENTER, now).method(method);
            }
            1 => {
                enc.event(TYPE_ALLOC, ALLOC_BACKTRACE, now)
                    .pointer(pointer_base + (i % 32) * 0x100)
                    .object((object_base + i * 4) << 3)
                    .uleb128(24 + (i as u64 % 200))
                    .methods(&[method, method_base, method_base + 0x40]);
            }
            2 => {
                enc.event(TYPE_SAMPLE, SAMPLE_HIT, now)
                    .pointer(pointer_base - 0x7000)
                    .pointers(&[pointer_base + 0x40_0000, pointer_base + 0x40_0400])
                    .methods(&[method, method_base]);
            }
            _ => {
                enc.event(TYPE_METHOD, METHOD_LEAVE, now).method(method);
            }
        }
    }
    enc
}

fn typical_stream(buffers: usize, events_per_buffer: usize) -> Vec<u8> {
    let mut writer = LogWriter::new(Vec::new(), &stream_header()).unwrap();
    for b in 0..buffers {
        let mut enc = typical_buffer(b as i64 % 8, events_per_buffer);
        if b % 4 == 3 {
            enc.event(TYPE_META, META_SYNC_POINT, 2_000_000).byte(0);
        }
        writer.write_encoded(enc).unwrap();
    }
    writer.into_inner()
}

struct TimestampSum(u64);

impl LogEventVisitor for TimestampSum {
    fn visit_before(&mut self, event: &LogEvent) {
        self.0 = self.0.wrapping_add(event.timestamp);
    }
}

fn bench_varints(c: &mut Criterion) {
    let mut bytes = Vec::new();
    for i in 0..10_000u64 {
        write_uleb128(&mut bytes, i.wrapping_mul(0x9E37_79B9_7F4A_7C15) >> (i % 64));
    }

    let mut group = c.benchmark_group("leb128");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("uleb128_10k", |b| {
        b.iter(|| {
            let mut reader = LogReader::new(bytes.as_slice());
            let mut acc = 0u64;
            while !reader.is_empty() {
                acc ^= reader.read_uleb128().unwrap();
            }
            black_box(acc)
        })
    });
    group.finish();
}

fn bench_buffer_decoder(c: &mut Criterion) {
    let stream = stream_header();
    let (header, payload) = typical_buffer(1, 4_096).into_parts();
    let header = Arc::new(header);

    let mut group = c.benchmark_group("buffer_decoder");
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("typical_4k_events", |b| {
        b.iter(|| {
            let mut decoder =
                BufferDecoder::new(&stream, Arc::clone(&header), black_box(&payload)).unwrap();
            let mut count = 0usize;
            while let Some(event) = decoder.next_event().unwrap() {
                black_box(&event);
                count += 1;
            }
            count
        })
    });
    group.finish();
}

fn bench_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("processor");
    for &buffers in &[16usize, 128] {
        let bytes = typical_stream(buffers, 512);
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("immediate", buffers), &bytes, |b, bytes| {
            b.iter(|| {
                let mut visitor = TimestampSum(0);
                LogProcessor::new(Cursor::new(bytes.as_slice()))
                    .with_immediate(&mut visitor)
                    .process()
                    .unwrap();
                black_box(visitor.0)
            })
        });

        group.bench_with_input(BenchmarkId::new("sorted", buffers), &bytes, |b, bytes| {
            b.iter(|| {
                let mut visitor = TimestampSum(0);
                LogProcessor::new(Cursor::new(bytes.as_slice()))
                    .with_sorted(&mut visitor)
                    .process()
                    .unwrap();
                black_box(visitor.0)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_varints,
    bench_buffer_decoder,
    bench_processor
);
criterion_main!(benches);
