//! Primitive value decoding for the log wire format.

use crate::error::{Error, Result};
use std::io::{ErrorKind, Read};

/// Longest LEB128 encoding of a 64-bit value.
pub const MAX_LEB128_LEN: usize = 10;

/// A little-endian primitive reader over any byte source.
///
/// The reader counts every byte it consumes so errors can report the offset
/// at which decoding stopped. Event payloads are decoded through a
/// `LogReader<&[u8]>` over a fully materialised buffer, which keeps the
/// outer stream cursor untouched by anything that goes wrong inside it.
pub struct LogReader<R: Read> {
    inner: R,
    offset: u64,
    // Reused by `read_cstring`.
    scratch: Vec<u8>,
}

impl<R: Read> LogReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_offset(inner, 0)
    }

    /// Creates a reader whose reported offsets start at `offset`.
    pub fn with_offset(inner: R, offset: u64) -> Self {
        Self {
            inner,
            offset,
            scratch: Vec::new(),
        }
    }

    /// Number of bytes consumed so far, including the starting offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fills `buf` completely or fails with `UnexpectedEof`.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => Error::UnexpectedEof {
                offset: self.offset,
            },
            _ => e.into(),
        })?;
        self.offset += buf.len() as u64;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    /// Reads an IEEE-754 double.
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads `len` raw bytes into a new vector.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.read_into(&mut bytes, len)?;
        Ok(bytes)
    }

    /// Replaces the contents of `buf` with the next `len` bytes.
    ///
    /// The vector grows only as data arrives, so a bogus length on a short
    /// source fails with `UnexpectedEof` instead of allocating up front.
    pub fn read_into(&mut self, buf: &mut Vec<u8>, len: usize) -> Result<()> {
        buf.clear();
        let read = (&mut self.inner).take(len as u64).read_to_end(buf)?;
        self.offset += read as u64;
        if read != len {
            return Err(Error::UnexpectedEof {
                offset: self.offset,
            });
        }
        Ok(())
    }

    /// Reads a stream header string: an i32 byte length followed by UTF-8.
    ///
    /// Producers count the terminating NUL in the length; it is dropped here.
    /// A non-positive length yields an empty string.
    pub fn read_header_string(&mut self) -> Result<String> {
        let len = self.read_i32()?;
        if len <= 0 {
            return Ok(String::new());
        }
        let mut bytes = self.read_bytes(len as usize)?;
        if bytes.last() == Some(&0) {
            bytes.pop();
        }
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Reads a NUL-terminated UTF-8 string. Invalid UTF-8 is replaced.
    pub fn read_cstring(&mut self) -> Result<String> {
        self.scratch.clear();
        loop {
            match self.read_u8()? {
                0 => break,
                b => self.scratch.push(b),
            }
        }
        Ok(String::from_utf8_lossy(&self.scratch).into_owned())
    }

    /// Reads an unsigned LEB128 value.
    pub fn read_uleb128(&mut self) -> Result<u64> {
        let start = self.offset;
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        for _ in 0..MAX_LEB128_LEN {
            let b = self.read_u8()?;
            result |= u64::from(b & 0x7F) << shift;
            if b & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
        }
        Err(Error::VarintOverflow { offset: start })
    }

    /// Reads a signed LEB128 value with two's-complement sign extension.
    pub fn read_sleb128(&mut self) -> Result<i64> {
        let start = self.offset;
        let mut result: i64 = 0;
        let mut shift: u32 = 0;
        for _ in 0..MAX_LEB128_LEN {
            let b = self.read_u8()?;
            result |= i64::from(b & 0x7F) << shift;
            shift += 7;
            if b & 0x80 == 0 {
                if shift < 64 && b & 0x40 != 0 {
                    result |= -1i64 << shift;
                }
                return Ok(result);
            }
        }
        Err(Error::VarintOverflow { offset: start })
    }
}

impl LogReader<&[u8]> {
    /// Unread bytes left in the slice.
    pub fn remaining(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
