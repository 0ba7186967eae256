//! # proflog
//!
//! A decoder and processor for the runtime log profiler's binary event log.
//!
//! ## Overview
//!
//! A profiler log is a stream header followed by buffers. Each buffer carries
//! the bases that its events are delta-encoded against: time, pointers,
//! object addresses and method ids. Field layouts vary across format versions
//! 13 to 16. `proflog` reconstructs typed events from such a stream and
//! delivers them to visitors in two orders:
//!
//! * **Immediate**: arrival order, as events are decoded.
//! * **Sorted**: ascending timestamp, one batch per synchronization point,
//!   with the remainder flushed at the end of the stream.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use proflog::*;
//! use std::fs::File;
//!
//! #[derive(Default)]
//! struct Allocations {
//!     bytes: u64,
//! }
//!
//! impl LogEventVisitor for Allocations {
//!     fn visit_allocation(&mut self, _event: &LogEvent, data: &AllocationEvent) {
//!         self.bytes += data.object_size;
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let mut allocations = Allocations::default();
//!     let summary = LogProcessor::new(File::open("output.mlpd")?)
//!         .with_immediate(&mut allocations)
//!         .process()?;
//!
//!     println!(
//!         "{} events from pid {}, {} bytes allocated",
//!         summary.events, summary.stream_header.process_id, allocations.bytes
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! * [`LogReader`]: little-endian primitives, strings and LEB128 varints.
//! * [`StreamHeader`] / [`BufferHeader`]: the two framing levels.
//! * [`FormatSchema`]: every version-dependent layout decision in one place.
//! * [`BufferDecoder`]: one buffer's payload to [`LogEvent`]s.
//! * [`LogEventVisitor`]: per-kind callbacks.
//! * [`LogProcessor`]: the stream loop, batching, sorting and cancellation.
//! * [`writer`]: the inverse encoders, for fixtures and tooling.

pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod framing;
pub mod processor;
pub mod reader;
pub mod schema;
pub mod tags;
pub mod visitor;
pub mod writer;

// Re-export the main public API for user convenience.
pub use config::{MovePairPolicy, ProcessorConfig};
pub use decoder::BufferDecoder;
pub use error::{Error, Result};
pub use event::*;
pub use framing::{BufferHeader, RunningCounters, StreamHeader};
pub use processor::{CancellationToken, LogProcessor, ProcessOutcome, ProcessSummary};
pub use reader::LogReader;
pub use schema::FormatSchema;
pub use visitor::{dispatch, LogEventVisitor, NoopVisitor};
pub use writer::{EventEncoder, LogWriter};
