//! Feed history: the durable, capped, most-recent-first log of accepted books.
//!
//! Position is decided when an identifier is first seen. Re-ingesting an
//! identifier never moves it or replaces its payload.

use std::collections::HashSet;

use crate::models::BookDescriptor;

/// Deduplicated, size-bounded history of accepted descriptors.
#[derive(Debug, Clone)]
pub struct FeedHistory {
    entries: Vec<BookDescriptor>,
    cap: usize,
}

impl FeedHistory {
    /// Wrap persisted entries, dropping duplicates and anything beyond `cap`.
    pub fn new(entries: Vec<BookDescriptor>, cap: usize) -> Self {
        let mut seen = HashSet::new();
        let mut entries: Vec<BookDescriptor> = entries
            .into_iter()
            .filter(|book| seen.insert(book.isbn.clone()))
            .collect();
        entries.truncate(cap);
        Self { entries, cap }
    }

    /// Ingest newly accepted books in the order received.
    ///
    /// Each unseen book is placed in front of everything before it, so the
    /// last book of `accepted` ends up first. Returns how many were inserted.
    pub fn ingest(&mut self, accepted: &[BookDescriptor]) -> usize {
        let fresh: Vec<BookDescriptor> = {
            let mut seen: HashSet<&str> = self.entries.iter().map(|b| b.isbn.as_str()).collect();
            accepted
                .iter()
                .filter(|book| seen.insert(book.isbn.as_str()))
                .cloned()
                .collect()
        };
        let inserted = fresh.len();

        let mut merged: Vec<BookDescriptor> = fresh.into_iter().rev().collect();
        merged.append(&mut self.entries);
        merged.truncate(self.cap);
        self.entries = merged;

        inserted
    }

    pub fn entries(&self) -> &[BookDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books(ids: &[&str]) -> Vec<BookDescriptor> {
        ids.iter()
            .map(|id| BookDescriptor::new(*id, format!("Title {id}")))
            .collect()
    }

    fn ids(history: &FeedHistory) -> Vec<&str> {
        history.entries().iter().map(|b| b.isbn.as_str()).collect()
    }

    #[test]
    fn test_ingest_at_cap_drops_oldest() {
        let mut history = FeedHistory::new(books(&["X", "Y"]), 2);
        assert_eq!(history.ingest(&books(&["Z"])), 1);
        assert_eq!(ids(&history), vec!["Z", "X"]);
    }

    #[test]
    fn test_ingest_order_is_most_recent_first() {
        let mut history = FeedHistory::new(books(&["X"]), 10);
        history.ingest(&books(&["A", "B"]));
        assert_eq!(ids(&history), vec!["B", "A", "X"]);
    }

    #[test]
    fn test_duplicate_keeps_first_position_and_payload() {
        let mut history = FeedHistory::new(books(&["A", "B"]), 10);
        let mut changed = BookDescriptor::new("B", "Changed");
        changed.subtitle = Some("new".into());

        assert_eq!(history.ingest(&[changed]), 0);
        assert_eq!(ids(&history), vec!["A", "B"]);
        assert_eq!(history.entries()[1].title, "Title B");
    }

    #[test]
    fn test_duplicate_within_one_call() {
        let mut history = FeedHistory::new(Vec::new(), 10);
        assert_eq!(history.ingest(&books(&["A", "B", "A"])), 2);
        assert_eq!(ids(&history), vec!["B", "A"]);
    }

    #[test]
    fn test_never_exceeds_cap() {
        let mut history = FeedHistory::new(books(&["P", "Q"]), 3);
        let many: Vec<String> = (0..50).map(|i| format!("N{i:02}")).collect();
        let many: Vec<&str> = many.iter().map(String::as_str).collect();
        history.ingest(&books(&many));
        assert_eq!(history.len(), 3);
        assert_eq!(ids(&history), vec!["N49", "N48", "N47"]);
    }

    #[test]
    fn test_new_repairs_persisted_duplicates() {
        let history = FeedHistory::new(books(&["A", "A", "B", "C"]), 2);
        assert_eq!(ids(&history), vec!["A", "B"]);
    }
}
