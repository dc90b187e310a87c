use fishid_core::types::{ClassificationResult, StillImage};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    // Insertion order; higher is newer.
    pub seq: u64,
    pub ts_unix_ms: i64,

    // Shared with the UI; stays valid as long as the entry exists.
    pub image: Arc<StillImage>,
    pub result: ClassificationResult,
}

/// Append-only, newest-first record of completed classifications.
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
    next_seq: u64,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an entry stamped with the next sequence number and the current time.
    pub fn record(&mut self, image: Arc<StillImage>, result: ClassificationResult) -> &HistoryEntry {
        let ts_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;

        let entry = HistoryEntry {
            seq: self.next_seq,
            ts_unix_ms,
            image,
            result,
        };
        self.append(entry);
        &self.entries[0]
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.next_seq = self.next_seq.max(entry.seq.saturating_add(1));
        self.entries.push_front(entry);
    }

    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
