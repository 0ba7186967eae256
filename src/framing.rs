//! Stream and buffer headers: the two framing levels of a log stream.
//!
//! ```text
//! stream  := stream_header buffer*
//! buffer  := buffer_header event{length bytes}
//! ```

use crate::error::{Error, Result};
use crate::reader::LogReader;
use crate::schema::FormatSchema;
use std::io::{Read, Write};

/// Magic value opening every log stream.
pub const STREAM_MAGIC: i32 = 0x4D50_5A01;
/// Magic value opening every buffer.
pub const BUFFER_MAGIC: i32 = 0x4D50_4C01;

/// Size in bytes of an encoded buffer header.
pub const BUFFER_HEADER_LEN: usize = 48;

/// The stream preamble. Parsed once; it gates every version-conditional
/// decode that follows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub major_version: u8,
    pub minor_version: u8,
    pub format_version: u8,
    pub pointer_size: u8,
    pub startup_time: u64,
    pub timer_overhead: i32,
    pub flags: i32,
    pub process_id: i32,
    pub port: u16,
    pub arguments: String,
    pub architecture: String,
    pub operating_system: String,
}

impl StreamHeader {
    /// Parses the stream header.
    ///
    /// The format version is checked before anything past it is read.
    pub fn read_from<R: Read>(reader: &mut LogReader<R>) -> Result<Self> {
        let magic = reader.read_i32()?;
        if magic != STREAM_MAGIC {
            return Err(Error::InvalidStreamMagic { found: magic });
        }
        let major_version = reader.read_u8()?;
        let minor_version = reader.read_u8()?;
        let format_version = reader.read_u8()?;
        FormatSchema::new(format_version)?;

        Ok(Self {
            major_version,
            minor_version,
            format_version,
            pointer_size: reader.read_u8()?,
            startup_time: reader.read_u64()?,
            timer_overhead: reader.read_i32()?,
            flags: reader.read_i32()?,
            process_id: reader.read_i32()?,
            port: reader.read_u16()?,
            arguments: reader.read_header_string()?,
            architecture: reader.read_header_string()?,
            operating_system: reader.read_header_string()?,
        })
    }

    /// Encodes the header. Strings are written with a trailing NUL counted in
    /// their length, as producers do.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&STREAM_MAGIC.to_le_bytes())?;
        writer.write_all(&[
            self.major_version,
            self.minor_version,
            self.format_version,
            self.pointer_size,
        ])?;
        writer.write_all(&self.startup_time.to_le_bytes())?;
        writer.write_all(&self.timer_overhead.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.process_id.to_le_bytes())?;
        writer.write_all(&self.port.to_le_bytes())?;
        for s in [&self.arguments, &self.architecture, &self.operating_system] {
            writer.write_all(&(s.len() as i32 + 1).to_le_bytes())?;
            writer.write_all(s.as_bytes())?;
            writer.write_all(&[0])?;
        }
        Ok(())
    }

    /// The field layout for this stream's format version.
    pub fn schema(&self) -> Result<FormatSchema> {
        FormatSchema::new(self.format_version)
    }

    /// True when pointers must be truncated to 32 bits.
    pub fn has_32bit_pointers(&self) -> bool {
        self.pointer_size == 4
    }
}

/// The per-buffer preamble carrying the bases that event deltas resolve against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferHeader {
    /// Exact number of event bytes following the header.
    pub length: usize,
    pub time_base: u64,
    pub pointer_base: i64,
    pub object_base: i64,
    pub thread_id: i64,
    pub method_base: i64,
}

impl BufferHeader {
    pub fn read_from<R: Read>(reader: &mut LogReader<R>) -> Result<Self> {
        let start = reader.offset();
        let magic = reader.read_i32()?;
        if magic != BUFFER_MAGIC {
            return Err(Error::InvalidBufferMagic {
                found: magic,
                offset: start,
            });
        }
        let length = reader.read_i32()?;
        if length < 0 {
            return Err(Error::InvalidBufferLength {
                length,
                offset: start,
            });
        }

        Ok(Self {
            length: length as usize,
            time_base: reader.read_u64()?,
            pointer_base: reader.read_i64()?,
            object_base: reader.read_i64()?,
            thread_id: reader.read_i64()?,
            method_base: reader.read_i64()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&BUFFER_MAGIC.to_le_bytes())?;
        writer.write_all(&(self.length as i32).to_le_bytes())?;
        writer.write_all(&self.time_base.to_le_bytes())?;
        writer.write_all(&self.pointer_base.to_le_bytes())?;
        writer.write_all(&self.object_base.to_le_bytes())?;
        writer.write_all(&self.thread_id.to_le_bytes())?;
        writer.write_all(&self.method_base.to_le_bytes())?;
        Ok(())
    }

    /// Fresh running counters for decoding this buffer.
    pub fn counters(&self) -> RunningCounters {
        RunningCounters {
            current_time: self.time_base,
            current_method: self.method_base,
        }
    }
}

/// The mutable delta state of one buffer's decode loop.
///
/// Seeded from the buffer header and advanced by every time and method
/// delta. Never carried from one buffer into the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunningCounters {
    pub current_time: u64,
    pub current_method: i64,
}

impl RunningCounters {
    /// Adds a time delta and returns the new absolute time.
    pub fn advance_time(&mut self, delta: u64) -> u64 {
        self.current_time = self.current_time.wrapping_add(delta);
        self.current_time
    }

    /// Adds a method delta and returns the new absolute method pointer.
    pub fn advance_method(&mut self, delta: i64) -> i64 {
        self.current_method = self.current_method.wrapping_add(delta);
        self.current_method
    }
}
