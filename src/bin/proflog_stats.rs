//! Summarises a profiler log: stream header details and per-kind event counts.

use anyhow::{Context, Result};
use clap::Parser;
use proflog::{
    CancellationToken, LogEvent, LogEventVisitor, LogProcessor, MovePairPolicy, ProcessOutcome,
    ProcessorConfig,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proflog-stats", version, about = "Summarise a profiler log file")]
struct Args {
    /// Log file to read
    path: PathBuf,

    /// Reject buffers larger than this many bytes
    #[arg(long)]
    max_buffer_len: Option<usize>,

    /// Drop the unpaired entry of odd GC move lists instead of failing
    #[arg(long)]
    truncate_odd_moves: bool,

    /// Count events through the timestamp-sorted visitor
    #[arg(long)]
    sorted: bool,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Default)]
struct KindCounter {
    counts: BTreeMap<&'static str, u64>,
    first: Option<u64>,
    last: Option<u64>,
}

impl LogEventVisitor for KindCounter {
    fn visit_before(&mut self, event: &LogEvent) {
        *self.counts.entry(event.data.name()).or_default() += 1;
        self.first = Some(self.first.map_or(event.timestamp, |t| t.min(event.timestamp)));
        self.last = Some(self.last.map_or(event.timestamp, |t| t.max(event.timestamp)));
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel()).context("installing Ctrl-C handler")?;

    let mut config = ProcessorConfig::default();
    if let Some(max) = args.max_buffer_len {
        config = config.with_max_buffer_length(max);
    }
    if args.truncate_odd_moves {
        config = config.with_move_pairs(MovePairPolicy::Truncate);
    }

    let file = File::open(&args.path)
        .with_context(|| format!("opening {}", args.path.display()))?;
    let mut counter = KindCounter::default();
    let processor = LogProcessor::new(file).with_config(config);
    let result = if args.sorted {
        processor.with_sorted(&mut counter).process_with_cancel(&token)
    } else {
        processor.with_immediate(&mut counter).process_with_cancel(&token)
    };
    let summary = result.with_context(|| format!("processing {}", args.path.display()))?;

    let header = &summary.stream_header;
    println!("file:            {}", args.path.display());
    println!(
        "producer:        {}.{} (format {}, {}-bit pointers)",
        header.major_version,
        header.minor_version,
        header.format_version,
        u32::from(header.pointer_size) * 8
    );
    println!("process id:      {}", header.process_id);
    println!("arguments:       {}", header.arguments);
    println!(
        "platform:        {} / {}",
        header.architecture, header.operating_system
    );
    println!("buffers:         {}", summary.buffers);
    println!("events:          {}", summary.events);
    if let (Some(first), Some(last)) = (counter.first, counter.last) {
        println!("time span:       {} ns", last - first);
    }
    if summary.outcome == ProcessOutcome::Cancelled {
        println!("(interrupted; counts are partial)");
    }

    println!();
    for (kind, count) in &counter.counts {
        println!("{kind:<24}{count:>12}");
    }
    Ok(())
}
