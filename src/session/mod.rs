//! Short-lived record of notes created locally but not yet echoed by the server.
//!
//! While a marker is present the reconciler will not remove that note, and a
//! remote "create" for it is reported as a confirmation of the optimistic
//! local render. Markers are a plain expiring map; they do not attempt causal
//! ordering.

use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionMarkers {
    /// note id -> creation time (monotonic ms)
    entries: BTreeMap<String, i64>,
}

impl SessionMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a locally originated note. Re-marking refreshes the timestamp.
    pub fn mark(&mut self, id: &str, now_ms: i64) {
        if id.trim().is_empty() {
            return;
        }
        self.entries.insert(id.to_string(), now_ms);
    }

    /// Drop the marker once the server snapshot contains the note.
    pub fn confirm(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn created_at(&self, id: &str) -> Option<i64> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn purge_expired(&mut self, now_ms: i64, grace_ms: i64) -> Vec<String> {
        purge_expired(self, now_ms, grace_ms)
    }
}

/// Remove every marker older than `grace_ms` and return the removed ids.
///
/// Age is `now_ms - created_at`; a marker exactly `grace_ms` old is kept.
pub fn purge_expired(markers: &mut SessionMarkers, now_ms: i64, grace_ms: i64) -> Vec<String> {
    let mut expired = Vec::new();
    markers.entries.retain(|id, created_at| {
        let keep = now_ms.saturating_sub(*created_at) <= grace_ms;
        if !keep {
            expired.push(id.clone());
        }
        keep
    });
    expired
}
