#![no_main]
use libfuzzer_sys::fuzz_target;
use proflog::{LogProcessor, MovePairPolicy, ProcessorConfig};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let config = ProcessorConfig::default()
        .with_max_buffer_length(1 << 20)
        .with_move_pairs(MovePairPolicy::Truncate);
    let _ = LogProcessor::new(Cursor::new(data))
        .with_config(config)
        .process();
});
