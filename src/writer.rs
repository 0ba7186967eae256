//! Producing log streams.
//!
//! The profiler itself is the real producer. This module writes the same
//! wire format so streams can be built for tests, fixtures and benchmarks:
//! [`EventEncoder`] assembles one buffer's payload with the deltas resolved
//! against that buffer's bases, and [`LogWriter`] frames the results.

use crate::error::Result;
use crate::framing::{BufferHeader, RunningCounters, StreamHeader};
use crate::tags;
use std::io::Write;

/// Appends `value` as ULEB128.
pub fn write_uleb128(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Appends `value` as SLEB128.
pub fn write_sleb128(out: &mut Vec<u8>, mut value: i64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        let sign_clear = byte & 0x40 == 0;
        if (value == 0 && sign_clear) || (value == -1 && !sign_clear) {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Frames a stream header followed by any number of buffers.
pub struct LogWriter<W: Write> {
    writer: W,
}

impl<W: Write> LogWriter<W> {
    /// Writes the stream header and returns a writer ready for buffers.
    pub fn new(mut writer: W, header: &StreamHeader) -> Result<Self> {
        header.write_to(&mut writer)?;
        Ok(Self { writer })
    }

    /// Writes `header` followed by `payload`. The header's length field is
    /// replaced by the payload length.
    pub fn write_buffer(&mut self, header: &BufferHeader, payload: &[u8]) -> Result<()> {
        let header = BufferHeader {
            length: payload.len(),
            ..header.clone()
        };
        header.write_to(&mut self.writer)?;
        self.writer.write_all(payload)?;
        Ok(())
    }

    pub fn write_encoded(&mut self, encoder: EventEncoder) -> Result<()> {
        let (header, payload) = encoder.into_parts();
        self.write_buffer(&header, &payload)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Builds the event payload of one buffer.
///
/// Fields that travel as deltas take absolute values here; the encoder keeps
/// the same running counters a decoder would.
pub struct EventEncoder {
    header: BufferHeader,
    counters: RunningCounters,
    payload: Vec<u8>,
}

impl EventEncoder {
    pub fn new(header: BufferHeader) -> Self {
        Self {
            counters: header.counters(),
            header,
            payload: Vec::new(),
        }
    }

    /// The buffer header with its length set to the current payload size.
    pub fn header(&self) -> BufferHeader {
        BufferHeader {
            length: self.payload.len(),
            ..self.header.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Starts an event: the tag byte and the delta to `timestamp`.
    pub fn event(&mut self, basic: u8, extended: u8, timestamp: u64) -> &mut Self {
        self.payload.push(tags::tag(basic, extended));
        let delta = timestamp.wrapping_sub(self.counters.current_time);
        self.counters.advance_time(delta);
        write_uleb128(&mut self.payload, delta);
        self
    }

    pub fn pointer(&mut self, pointer: i64) -> &mut Self {
        write_sleb128(
            &mut self.payload,
            pointer.wrapping_sub(self.header.pointer_base),
        );
        self
    }

    /// Writes an object address, which must be 8-byte aligned.
    pub fn object(&mut self, object: i64) -> &mut Self {
        write_sleb128(
            &mut self.payload,
            (object >> 3).wrapping_sub(self.header.object_base),
        );
        self
    }

    pub fn method(&mut self, method: i64) -> &mut Self {
        let delta = method.wrapping_sub(self.counters.current_method);
        self.counters.advance_method(delta);
        write_sleb128(&mut self.payload, delta);
        self
    }

    /// A managed backtrace: count, then method frames.
    pub fn methods(&mut self, frames: &[i64]) -> &mut Self {
        self.uleb128(frames.len() as u64);
        for &frame in frames {
            self.method(frame);
        }
        self
    }

    /// An unmanaged backtrace: count, then pointer frames.
    pub fn pointers(&mut self, frames: &[i64]) -> &mut Self {
        self.uleb128(frames.len() as u64);
        for &frame in frames {
            self.pointer(frame);
        }
        self
    }

    pub fn uleb128(&mut self, value: u64) -> &mut Self {
        write_uleb128(&mut self.payload, value);
        self
    }

    pub fn sleb128(&mut self, value: i64) -> &mut Self {
        write_sleb128(&mut self.payload, value);
        self
    }

    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.payload.push(value);
        self
    }

    pub fn f64(&mut self, value: f64) -> &mut Self {
        self.payload.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn cstring(&mut self, value: &str) -> &mut Self {
        self.payload.extend_from_slice(value.as_bytes());
        self.payload.push(0);
        self
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.payload.extend_from_slice(value);
        self
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn into_parts(self) -> (BufferHeader, Vec<u8>) {
        (self.header(), self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::LogReader;

    fn stream() -> StreamHeader {
        StreamHeader {
            major_version: 6,
            minor_version: 0,
            format_version: 16,
            pointer_size: 8,
            startup_time: 0,
            timer_overhead: 0,
            flags: 0,
            process_id: 7,
            port: 0,
            arguments: String::new(),
            architecture: "x86_64".into(),
            operating_system: "linux".into(),
        }
    }

    #[test]
    fn test_leb128_known_encodings() {
        let mut out = Vec::new();
        write_uleb128(&mut out, 624_485);
        assert_eq!(out, [0xE5, 0x8E, 0x26]);

        out.clear();
        write_sleb128(&mut out, -123_456);
        assert_eq!(out, [0xC0, 0xBB, 0x78]);

        out.clear();
        write_uleb128(&mut out, 0);
        write_sleb128(&mut out, 0);
        assert_eq!(out, [0x00, 0x00]);

        out.clear();
        write_sleb128(&mut out, -1);
        assert_eq!(out, [0x7F]);

        out.clear();
        write_sleb128(&mut out, 64);
        assert_eq!(out, [0xC0, 0x00]);
    }

    #[test]
    fn test_leb128_extremes_decode() {
        let mut out = Vec::new();
        write_uleb128(&mut out, u64::MAX);
        write_sleb128(&mut out, i64::MIN);
        write_sleb128(&mut out, i64::MAX);
        let mut r = LogReader::new(out.as_slice());
        assert_eq!(r.read_uleb128().unwrap(), u64::MAX);
        assert_eq!(r.read_sleb128().unwrap(), i64::MIN);
        assert_eq!(r.read_sleb128().unwrap(), i64::MAX);
        assert!(r.is_empty());
    }

    #[test]
    fn test_encoder_tracks_deltas() {
        let header = BufferHeader {
            length: 0,
            time_base: 100,
            pointer_base: 0x1000,
            object_base: 0x10,
            thread_id: 1,
            method_base: 50,
        };
        let mut enc = EventEncoder::new(header);
        enc.event(tags::TYPE_METHOD, tags::METHOD_ENTER, 103).method(60);
        enc.event(tags::TYPE_METHOD, tags::METHOD_LEAVE, 110).method(58);
        enc.pointer(0x1001).object(0x88);

        assert_eq!(
            enc.header().length,
            enc.len(),
            "header length follows the payload"
        );
        let payload = enc.into_payload();
        // tag, +3, +10, tag, +7, -2, +1, 0x11 - 0x10
        assert_eq!(payload, [0x23, 3, 10, 0x13, 7, 0x7E, 1, 1]);
    }

    #[test]
    fn test_writer_frames_buffers() {
        let s = stream();
        let mut writer = LogWriter::new(Vec::new(), &s).unwrap();
        let mut enc = EventEncoder::new(BufferHeader {
            length: 999,
            time_base: 0,
            pointer_base: 0,
            object_base: 0,
            thread_id: 1,
            method_base: 0,
        });
        enc.event(tags::TYPE_HEAP, tags::HEAP_START, 5);
        writer.write_encoded(enc).unwrap();
        let bytes = writer.into_inner();

        let mut r = LogReader::new(bytes.as_slice());
        assert_eq!(StreamHeader::read_from(&mut r).unwrap(), s);
        let buffer = BufferHeader::read_from(&mut r).unwrap();
        assert_eq!(buffer.length, 2);
        assert_eq!(r.read_bytes(2).unwrap(), vec![0x06, 5]);
        assert!(r.is_empty());
    }
}
