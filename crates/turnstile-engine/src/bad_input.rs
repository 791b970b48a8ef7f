//! Frequency counts of commands nobody recognized.

use indexmap::IndexMap;

/// Counts unrecognized command lines so content authors can see what
/// players keep trying to type.
#[derive(Clone, Debug, Default)]
pub struct BadInputTracker {
    counts: IndexMap<String, u64>,
}

impl BadInputTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `command rest`.
    pub fn track(&mut self, command: &str, rest: &str) {
        let key = if rest.is_empty() {
            command.to_string()
        } else {
            format!("{command} {rest}")
        };
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Times a given line was seen.
    pub fn count(&self, line: &str) -> u64 {
        self.counts.get(line).copied().unwrap_or(0)
    }

    /// The `n` most frequent lines, most frequent first. Ties keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<(&str, u64)> {
        let mut all: Vec<(&str, u64)> = self.counts.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        all.sort_by(|a, b| b.1.cmp(&a.1));
        all.truncate(n);
        all
    }

    /// Total occurrences across all lines.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
