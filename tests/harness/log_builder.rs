#![allow(dead_code)]

use proflog::{BufferHeader, EventEncoder, LogEvent, LogEventVisitor, LogWriter, StreamHeader};

pub const TIME_BASE: u64 = 1_000_000;
pub const POINTER_BASE: i64 = 0x7F00_0000_0000;
pub const OBJECT_BASE: i64 = 0x0200_0000;
pub const METHOD_BASE: i64 = 0x5000_0000;

pub fn stream_header(format_version: u8, pointer_size: u8) -> StreamHeader {
    StreamHeader {
        major_version: 6,
        minor_version: 12,
        format_version,
        pointer_size,
        startup_time: 1_700_000_000_000,
        timer_overhead: 40,
        flags: 0,
        process_id: 31337,
        port: 0,
        arguments: "mono --profile=log:sample app.exe".to_string(),
        architecture: "x86_64".to_string(),
        operating_system: "linux".to_string(),
    }
}

pub fn buffer_header(thread_id: i64) -> BufferHeader {
    BufferHeader {
        length: 0,
        time_base: TIME_BASE,
        pointer_base: POINTER_BASE,
        object_base: OBJECT_BASE,
        thread_id,
        method_base: METHOD_BASE,
    }
}

/// Assembles a complete log stream buffer by buffer.
pub struct LogBuilder {
    writer: LogWriter<Vec<u8>>,
}

impl LogBuilder {
    pub fn new(format_version: u8) -> Self {
        Self::with_stream(&stream_header(format_version, 8))
    }

    pub fn with_stream(header: &StreamHeader) -> Self {
        Self {
            writer: LogWriter::new(Vec::new(), header).unwrap(),
        }
    }

    pub fn buffer(&mut self, header: BufferHeader, build: impl FnOnce(&mut EventEncoder)) -> &mut Self {
        let mut encoder = EventEncoder::new(header);
        build(&mut encoder);
        self.writer.write_encoded(encoder).unwrap();
        self
    }

    /// A buffer of `HeapEnd` markers at the given timestamps.
    pub fn markers(&mut self, thread_id: i64, times: &[u64]) -> &mut Self {
        self.buffer(buffer_header(thread_id), |enc| {
            for &t in times {
                enc.event(proflog::tags::TYPE_HEAP, proflog::tags::HEAP_END, t);
            }
        })
    }

    pub fn sync_point(&mut self, thread_id: i64, time: u64) -> &mut Self {
        self.buffer(buffer_header(thread_id), |enc| {
            enc.event(proflog::tags::TYPE_META, proflog::tags::META_SYNC_POINT, time)
                .byte(0);
        })
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

/// Clones every event it sees.
#[derive(Default)]
pub struct Collector {
    pub events: Vec<LogEvent>,
}

impl Collector {
    pub fn timestamps(&self) -> Vec<u64> {
        self.events.iter().map(|e| e.timestamp).collect()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.data.name()).collect()
    }
}

impl LogEventVisitor for Collector {
    fn visit_before(&mut self, event: &LogEvent) {
        self.events.push(event.clone());
    }
}
