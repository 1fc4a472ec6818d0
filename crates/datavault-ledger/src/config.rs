//! Ledger configuration.

/// Configuration shared by the ledger backends.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Buffer size of the live event channel. Slow subscribers that fall
    /// further behind than this miss events (the log still has them).
    pub event_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
        }
    }
}

impl LedgerConfig {
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}
