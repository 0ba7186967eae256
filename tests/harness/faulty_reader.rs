use std::io::{Error, ErrorKind, Read, Result};

/// Wraps a byte source and misbehaves in a controlled way.
pub struct FaultyReader<R: Read> {
    inner: R,
    mode: FaultMode,
    calls: usize,
    delivered: usize,
}

pub enum FaultMode {
    /// Never returns more than one byte per call.
    OneByteChunks,
    /// Every n-th call fails with `Interrupted` and delivers nothing.
    InterruptedEvery(usize),
    /// Reports end of input once this many bytes were delivered.
    EofAfterBytes(usize),
    /// Fails with a hard error once this many bytes were delivered.
    BrokenPipeAfterBytes(usize),
}

impl<R: Read> FaultyReader<R> {
    pub fn new(inner: R, mode: FaultMode) -> Self {
        Self {
            inner,
            mode,
            calls: 0,
            delivered: 0,
        }
    }

    fn read_limited(&mut self, buf: &mut [u8], limit: usize) -> Result<usize> {
        let n = buf.len().min(limit);
        let read = self.inner.read(&mut buf[..n])?;
        self.delivered += read;
        Ok(read)
    }
}

impl<R: Read> Read for FaultyReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.calls += 1;
        if buf.is_empty() {
            return Ok(0);
        }
        match self.mode {
            FaultMode::OneByteChunks => self.read_limited(buf, 1),
            FaultMode::InterruptedEvery(n) if n != 0 && self.calls % n == 0 => {
                Err(Error::from(ErrorKind::Interrupted))
            }
            FaultMode::InterruptedEvery(_) => self.read_limited(buf, usize::MAX),
            FaultMode::EofAfterBytes(limit) => {
                let left = limit.saturating_sub(self.delivered);
                if left == 0 {
                    Ok(0)
                } else {
                    self.read_limited(buf, left)
                }
            }
            FaultMode::BrokenPipeAfterBytes(limit) => {
                let left = limit.saturating_sub(self.delivered);
                if left == 0 {
                    Err(Error::from(ErrorKind::BrokenPipe))
                } else {
                    self.read_limited(buf, left)
                }
            }
        }
    }
}
