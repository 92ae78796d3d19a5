use serde::{Deserialize, Serialize};

/// Open queue items by status. Terminal items are not retained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub in_progress: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress
    }
}
