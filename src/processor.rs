//! Whole-stream processing.
//!
//! [`LogProcessor`] drives a log stream from its header to the end of the
//! source. Every decoded event goes to the immediate visitor in arrival order,
//! and is also kept in a pending batch. At each synchronization point the
//! batch is stable-sorted by timestamp and handed to the sorted visitor.
//! Whatever is still pending at the end of the stream is flushed the same way.
//!
//! ```rust
//! # use proflog::{LogProcessor, LogEventVisitor, LogEvent, ProcessOutcome, StreamHeader};
//! # use std::io::Cursor;
//! # fn main() -> proflog::Result<()> {
//! # let header = StreamHeader {
//! #     major_version: 6, minor_version: 0, format_version: 16, pointer_size: 8,
//! #     startup_time: 0, timer_overhead: 0, flags: 0, process_id: 1, port: 0,
//! #     arguments: String::new(), architecture: String::new(),
//! #     operating_system: String::new(),
//! # };
//! # let mut bytes = Vec::new();
//! # header.write_to(&mut bytes)?;
//! #[derive(Default)]
//! struct Count(usize);
//!
//! impl LogEventVisitor for Count {
//!     fn visit_before(&mut self, _event: &LogEvent) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let mut count = Count::default();
//! let summary = LogProcessor::new(Cursor::new(bytes))
//!     .with_sorted(&mut count)
//!     .process()?;
//! assert_eq!(summary.outcome, ProcessOutcome::Completed);
//! assert_eq!(count.0 as u64, summary.events);
//! # Ok(())
//! # }
//! ```

use crate::config::ProcessorConfig;
use crate::decoder::BufferDecoder;
use crate::error::{Error, Result};
use crate::event::LogEvent;
use crate::framing::{BufferHeader, StreamHeader};
use crate::reader::LogReader;
use crate::visitor::{dispatch, LogEventVisitor, NoopVisitor};
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// A cloneable flag that asks a running processor to stop.
///
/// The processor checks it before each buffer and before each event.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The source was read to its end and every event was delivered.
    Completed,
    /// Cancellation was observed. Events not yet delivered to the sorted
    /// visitor were discarded.
    Cancelled,
}

/// What a finished run saw.
#[derive(Debug, Clone)]
pub struct ProcessSummary {
    pub stream_header: StreamHeader,
    pub outcome: ProcessOutcome,
    /// Buffers whose header was read.
    pub buffers: u64,
    /// Events decoded and delivered to the immediate visitor.
    pub events: u64,
}

/// Decodes a log stream and delivers its events to visitors.
///
/// Either visitor may be left out; it then defaults to [`NoopVisitor`].
/// Pass `&mut visitor` to keep ownership of a visitor and inspect it after
/// the run. Processing consumes the processor, so each one runs once.
pub struct LogProcessor<R: Read, I = NoopVisitor, S = NoopVisitor> {
    source: R,
    immediate: I,
    sorted: S,
    config: ProcessorConfig,
}

impl<R: Read> LogProcessor<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            immediate: NoopVisitor,
            sorted: NoopVisitor,
            config: ProcessorConfig::default(),
        }
    }
}

impl<R: Read, I: LogEventVisitor, S: LogEventVisitor> LogProcessor<R, I, S> {
    /// Sets the visitor that sees events in arrival order.
    pub fn with_immediate<V: LogEventVisitor>(self, visitor: V) -> LogProcessor<R, V, S> {
        LogProcessor {
            source: self.source,
            immediate: visitor,
            sorted: self.sorted,
            config: self.config,
        }
    }

    /// Sets the visitor that sees events sorted by timestamp.
    pub fn with_sorted<V: LogEventVisitor>(self, visitor: V) -> LogProcessor<R, I, V> {
        LogProcessor {
            source: self.source,
            immediate: self.immediate,
            sorted: visitor,
            config: self.config,
        }
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Processes the whole stream.
    pub fn process(self) -> Result<ProcessSummary> {
        self.process_with_cancel(&CancellationToken::new())
    }

    /// Processes the stream until it ends or `cancel` is triggered.
    ///
    /// A decode or I/O error stops the run at once; events delivered before
    /// it stay delivered and nothing after it reaches a visitor.
    pub fn process_with_cancel(self, cancel: &CancellationToken) -> Result<ProcessSummary> {
        let LogProcessor {
            source,
            immediate,
            sorted,
            config,
        } = self;
        let mut run = Run {
            reader: LogReader::new(BufReader::new(source)),
            immediate,
            sorted,
            pending: Vec::with_capacity(config.batch_capacity),
            config,
        };

        run.execute(cancel).inspect_err(|e| {
            if e.is_format_error() {
                debug!(error = %e, "log stream rejected");
            }
        })
    }
}

/// The state of one processing run.
struct Run<R: Read, I, S> {
    reader: LogReader<BufReader<R>>,
    immediate: I,
    sorted: S,
    pending: Vec<LogEvent>,
    config: ProcessorConfig,
}

impl<R: Read, I: LogEventVisitor, S: LogEventVisitor> Run<R, I, S> {
    fn execute(&mut self, cancel: &CancellationToken) -> Result<ProcessSummary> {
        let stream_header = StreamHeader::read_from(&mut self.reader)?;
        debug!(
            format_version = stream_header.format_version,
            pointer_size = stream_header.pointer_size,
            process_id = stream_header.process_id,
            "read stream header"
        );

        let mut payload = Vec::new();
        let mut buffers = 0u64;
        let mut events = 0u64;

        let cancelled = 'stream: loop {
            if cancel.is_cancelled() {
                break true;
            }
            if at_end(self.reader.get_mut())? {
                break false;
            }

            let header_offset = self.reader.offset();
            let header = BufferHeader::read_from(&mut self.reader)?;
            if let Some(limit) = self.config.max_buffer_length {
                if header.length > limit {
                    return Err(Error::BufferTooLarge {
                        length: header.length,
                        limit,
                    });
                }
            }
            debug!(
                offset = header_offset,
                length = header.length,
                thread_id = header.thread_id,
                "read buffer header"
            );
            buffers += 1;

            let payload_offset = self.reader.offset();
            self.reader.read_into(&mut payload, header.length)?;

            let mut decoder = BufferDecoder::new(&stream_header, Arc::new(header), &payload)?
                .with_base_offset(payload_offset)
                .with_move_pairs(self.config.move_pairs);
            loop {
                if cancel.is_cancelled() {
                    break 'stream true;
                }
                let Some(event) = decoder.next_event()? else {
                    break;
                };
                events += 1;
                dispatch(&mut self.immediate, &event);
                let sync = event.is_synchronization_point();
                self.pending.push(event);
                if sync && !self.flush_sorted(cancel) {
                    break 'stream true;
                }
            }
        };

        let outcome = if cancelled {
            debug!(discarded = self.pending.len(), "processing cancelled");
            self.pending.clear();
            ProcessOutcome::Cancelled
        } else if self.flush_sorted(cancel) {
            ProcessOutcome::Completed
        } else {
            ProcessOutcome::Cancelled
        };

        Ok(ProcessSummary {
            stream_header,
            outcome,
            buffers,
            events,
        })
    }

    /// Delivers the pending batch in timestamp order. Returns false if
    /// cancellation cut the batch short; the undelivered rest is discarded.
    fn flush_sorted(&mut self, cancel: &CancellationToken) -> bool {
        if self.pending.is_empty() {
            return true;
        }
        trace!(events = self.pending.len(), "flushing sorted batch");
        // Stable: equal timestamps keep arrival order.
        self.pending.sort_by_key(|event| event.timestamp);
        let mut batch = self.pending.drain(..);
        while let Some(event) = batch.next() {
            if cancel.is_cancelled() {
                debug!(discarded = batch.len() + 1, "sorted flush cancelled");
                return false;
            }
            dispatch(&mut self.sorted, &event);
        }
        true
    }
}

/// True when the source has no more bytes.
fn at_end<B: BufRead>(source: &mut B) -> Result<bool> {
    loop {
        match source.fill_buf() {
            Ok(buf) => return Ok(buf.is_empty()),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}
