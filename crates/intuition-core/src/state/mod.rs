//! Poll state carried between invocations of one configured trigger node.

pub mod static_data;

use std::collections::HashMap;

use chrono::{DateTime, Utc};

pub use static_data::StaticData;

/// State of one detector, loaded from [`StaticData`] before a poll and
/// written back after a successful one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollState {
    /// High-water mark of `created_at` for cursor-based detection.
    pub cursor: Option<DateTime<Utc>>,
    /// Identifiers already emitted (or seeded) by seen-set detection.
    pub seen: SeenSet,
    /// Set once the cursor or seen-set has been seeded. Never reset.
    pub initialized: bool,
}

impl PollState {
    /// Advance the cursor, ignoring values older than the current mark.
    /// Returns whether the cursor moved.
    pub fn advance_cursor(&mut self, to: DateTime<Utc>) -> bool {
        match self.cursor {
            Some(current) if current >= to => false,
            _ => {
                self.cursor = Some(to);
                self.initialized = true;
                true
            }
        }
    }
}

/// Bounded map from record identifier to the local time (epoch millis) it
/// was first observed. The stamps only order eviction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenSet {
    entries: HashMap<String, i64>,
    newest: i64,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from persisted `(id, stamp)` pairs.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, i64)>) -> Self {
        let entries: HashMap<String, i64> = entries.into_iter().collect();
        let newest = entries.values().copied().max().unwrap_or(i64::MIN);
        Self { entries, newest }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Insertion stamp of `id`, if present.
    pub fn stamp(&self, id: &str) -> Option<i64> {
        self.entries.get(id).copied()
    }

    /// Mark `id` as seen at `now_ms`. Returns `false` when it was already
    /// present, in which case its stamp is left unchanged.
    ///
    /// Stamps are strictly increasing within a set: an insertion in the same
    /// millisecond as the previous one is stamped one millisecond later.
    pub fn insert(&mut self, id: String, now_ms: i64) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        let stamp = if self.entries.is_empty() {
            now_ms
        } else {
            now_ms.max(self.newest.saturating_add(1))
        };
        self.newest = self.newest.max(stamp);
        self.entries.insert(id, stamp);
        true
    }

    /// Drop the oldest entries until at most `max` remain. Ties on the stamp
    /// break by identifier. Returns the evicted identifiers, oldest first.
    pub fn evict_to(&mut self, max: usize) -> Vec<String> {
        if self.entries.len() <= max {
            return Vec::new();
        }
        let mut ordered: Vec<(i64, String)> = self
            .entries
            .iter()
            .map(|(id, stamp)| (*stamp, id.clone()))
            .collect();
        ordered.sort();

        let excess = self.entries.len() - max;
        let evicted: Vec<String> = ordered.into_iter().take(excess).map(|(_, id)| id).collect();
        for id in &evicted {
            self.entries.remove(id);
        }
        evicted
    }

    /// Iterate over `(id, stamp)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(id, stamp)| (id.as_str(), *stamp))
    }
}
