//! Streams assembled byte by byte, independent of the writer module.

use proflog::*;
use std::io::Cursor;

mod harness {
    pub mod log_builder;
}
use harness::log_builder::Collector;

fn handmade_stream() -> Vec<u8> {
    let mut out = Vec::new();
    // Stream header.
    out.extend_from_slice(&[0x01, 0x5A, 0x50, 0x4D]);
    out.extend_from_slice(&[6, 0, 14, 8]);
    out.extend_from_slice(&1_700_000_000_000u64.to_le_bytes());
    out.extend_from_slice(&25i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&4242i32.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&2i32.to_le_bytes());
    out.extend_from_slice(b"a\0");
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&3i32.to_le_bytes());
    out.extend_from_slice(b"osx");

    let payload: &[u8] = &[
        0x23, 0x05, 0x0A, // Enter: +5 ns, method +10
        0x07, 0x01, 0x7F, 0x01, 0x10, 0x00, // SampleHit: +1 ns, thread -1, one native frame
        0x0A, 0x00, 0x02, // SynchronizationPoint: world start
    ];

    // Buffer header.
    out.extend_from_slice(&[0x01, 0x4C, 0x50, 0x4D]);
    out.extend_from_slice(&(payload.len() as i32).to_le_bytes());
    out.extend_from_slice(&100u64.to_le_bytes());
    out.extend_from_slice(&0x1000i64.to_le_bytes());
    out.extend_from_slice(&0x10i64.to_le_bytes());
    out.extend_from_slice(&7i64.to_le_bytes());
    out.extend_from_slice(&0x500i64.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

#[test]
fn handmade_stream_decodes() {
    let mut collector = Collector::default();
    let summary = LogProcessor::new(Cursor::new(handmade_stream()))
        .with_immediate(&mut collector)
        .process()
        .unwrap();

    let header = &summary.stream_header;
    assert_eq!(header.format_version, 14);
    assert_eq!(header.timer_overhead, 25);
    assert_eq!(header.process_id, 4242);
    assert_eq!(header.arguments, "a");
    assert_eq!(header.architecture, "");
    assert_eq!(header.operating_system, "osx");

    let events: Vec<(u64, EventData)> = collector
        .events
        .iter()
        .map(|e| (e.timestamp, e.data.clone()))
        .collect();
    assert_eq!(
        events,
        vec![
            (105, EventData::Enter(MethodEvent { method_pointer: 0x50A })),
            (
                106,
                EventData::SampleHit(SampleHitEvent {
                    thread_id: 0xFFF,
                    unmanaged_backtrace: vec![0x1010],
                    managed_backtrace: vec![],
                })
            ),
            (
                106,
                EventData::SynchronizationPoint(SynchronizationPointEvent {
                    kind: SyncPointKind::WorldStart,
                })
            ),
        ]
    );
    assert!(collector.events.iter().all(|e| e.buffer.thread_id == 7));
}

#[test]
fn writer_matches_handmade_layout() {
    let handmade = handmade_stream();
    let mut reader = LogReader::new(handmade.as_slice());
    let stream = StreamHeader::read_from(&mut reader).unwrap();
    let buffer = BufferHeader::read_from(&mut reader).unwrap();
    let payload_start = reader.offset() as usize;

    let mut writer = LogWriter::new(Vec::new(), &stream).unwrap();
    let mut enc = EventEncoder::new(buffer.clone());
    enc.event(tags::TYPE_METHOD, tags::METHOD_ENTER, 105).method(0x50A);
    enc.event(tags::TYPE_SAMPLE, tags::SAMPLE_HIT, 106)
        .pointer(0xFFF)
        .pointers(&[0x1010])
        .methods(&[]);
    enc.event(tags::TYPE_META, tags::META_SYNC_POINT, 106).byte(2);
    writer.write_encoded(enc).unwrap();
    let written = writer.into_inner();

    // The writer always NUL-terminates header strings, so only the
    // buffer is compared byte for byte.
    let mut reader = LogReader::new(written.as_slice());
    StreamHeader::read_from(&mut reader).unwrap();
    let written_start = reader.offset() as usize;
    assert_eq!(
        &written[written_start..],
        &handmade[payload_start - proflog::framing::BUFFER_HEADER_LEN..]
    );
}
