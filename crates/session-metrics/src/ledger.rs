//! Per-application distracted time

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the distractor report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistractorEntry {
    pub name: String,
    pub seconds: f64,
}

/// Distracted seconds keyed by normalized application name.
///
/// Remembers first-seen order so equal totals report deterministically.
#[derive(Debug, Clone, Default)]
pub struct DistractorLedger {
    entries: Vec<DistractorEntry>,
    index: HashMap<String, usize>,
}

impl DistractorLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute `seconds` to `name`
    pub fn add(&mut self, name: &str, seconds: f64) {
        if seconds <= 0.0 {
            return;
        }
        match self.index.get(name) {
            Some(&i) => self.entries[i].seconds += seconds,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(DistractorEntry {
                    name: name.to_string(),
                    seconds,
                });
            }
        }
    }

    /// Seconds attributed to `name`
    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| self.entries[i].seconds)
    }

    /// Sum over all buckets
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.seconds).sum()
    }

    /// Entries sorted by seconds descending, ties in first-seen order
    pub fn report(&self) -> Vec<DistractorEntry> {
        let mut sorted = self.entries.clone();
        // Stable sort keeps insertion order for ties
        sorted.sort_by(|a, b| b.seconds.total_cmp(&a.seconds));
        sorted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}
