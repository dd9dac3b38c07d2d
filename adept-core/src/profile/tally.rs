//! Per-category accumulation of aspects, used for both strengths and weaknesses.

use serde::{Deserialize, Serialize};

use crate::types::Aspect;

/// One category and the aspects observed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub category: String,
    pub aspects: Vec<Aspect>,
    pub count: u32,
}

/// Ordered list of categories, each with the distinct aspects observed.
///
/// A category's `count` only grows when a new aspect is added to it, so it
/// always equals `aspects.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTally {
    entries: Vec<TallyEntry>,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `aspect` under `category`. Returns true if the tally changed.
    pub fn observe(&mut self, category: &str, aspect: Aspect) -> bool {
        match self.entries.iter_mut().find(|e| e.category == category) {
            Some(entry) if entry.aspects.contains(&aspect) => false,
            Some(entry) => {
                entry.aspects.push(aspect);
                entry.count += 1;
                true
            }
            None => {
                self.entries.push(TallyEntry {
                    category: category.to_string(),
                    aspects: vec![aspect],
                    count: 1,
                });
                true
            }
        }
    }

    /// Up to `n` entries, highest count first. Ties keep insertion order.
    pub fn top(&self, n: usize) -> Vec<TallyEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.count.cmp(&a.count));
        sorted.truncate(n);
        sorted
    }

    /// The entry with the highest count, earliest on ties.
    pub fn leader(&self) -> Option<&TallyEntry> {
        self.entries
            .iter()
            .reduce(|best, e| if e.count > best.count { e } else { best })
    }

    pub fn contains(&self, category: &str) -> bool {
        self.entries.iter().any(|e| e.category == category)
    }

    pub fn get(&self, category: &str) -> Option<&TallyEntry> {
        self.entries.iter().find(|e| e.category == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TallyEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
