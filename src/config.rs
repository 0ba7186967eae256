//! Processor configuration.

/// What to do with a GC move list holding an odd number of object pointers.
///
/// Move lists are flat sequences of (old, new) pairs, so an odd length means
/// the producer wrote something this decoder cannot pair up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovePairPolicy {
    /// Fail with `Error::UnpairedMoveList` once the list has been consumed.
    #[default]
    Reject,
    /// Drop the trailing unpaired pointer and log a warning.
    Truncate,
}

/// Tunables for [`LogProcessor`](crate::LogProcessor).
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Reject buffers whose declared length exceeds this many bytes.
    /// `None` trusts the producer's cap.
    pub max_buffer_length: Option<usize>,
    /// Initial capacity of the pending (not yet sorted) event batch.
    pub batch_capacity: usize,
    pub move_pairs: MovePairPolicy,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            max_buffer_length: None,
            batch_capacity: cpus * 1000,
            move_pairs: MovePairPolicy::Reject,
        }
    }
}

impl ProcessorConfig {
    pub fn with_max_buffer_length(mut self, max: usize) -> Self {
        self.max_buffer_length = Some(max);
        self
    }

    pub fn with_batch_capacity(mut self, capacity: usize) -> Self {
        self.batch_capacity = capacity;
        self
    }

    pub fn with_move_pairs(mut self, policy: MovePairPolicy) -> Self {
        self.move_pairs = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_trust_producer() {
        let config = ProcessorConfig::default();
        assert_eq!(config.max_buffer_length, None);
        assert!(config.batch_capacity >= 1000);
        assert_eq!(config.move_pairs, MovePairPolicy::Reject);
    }

    #[test]
    fn builder_methods_compose() {
        let config = ProcessorConfig::default()
            .with_max_buffer_length(1 << 20)
            .with_batch_capacity(16)
            .with_move_pairs(MovePairPolicy::Truncate);
        assert_eq!(config.max_buffer_length, Some(1 << 20));
        assert_eq!(config.batch_capacity, 16);
        assert_eq!(config.move_pairs, MovePairPolicy::Truncate);
    }
}
