//! Command history with cursor-based recall.

use crate::utils::RingBuffer;

/// Ordered log of submitted lines.
///
/// Entries are numbered from 1 as `history` prints them. Numbers stay stable
/// when old entries fall off the front of the bounded buffer.
#[derive(Clone, Debug)]
pub struct HistoryBuffer {
    entries: RingBuffer<String>,
    /// Entries evicted or cleared before the current first one.
    offset: usize,
    /// Recall position; `None` means past the newest entry.
    cursor: Option<usize>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RingBuffer::new(capacity),
            offset: 0,
            cursor: None,
        }
    }

    /// Append a line and reset the recall cursor. Blank lines are ignored.
    pub fn push(&mut self, line: &str) {
        self.cursor = None;
        if line.trim().is_empty() {
            return;
        }
        if self.entries.len() == self.entries.capacity() {
            self.offset += 1;
        }
        self.entries.push(line.to_string());
    }

    /// Step back to the previous entry. Stays on the oldest one.
    pub fn recall_previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let index = match self.cursor {
            None => self.entries.len() - 1,
            Some(i) => i.saturating_sub(1),
        };
        self.cursor = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    /// Step forward; `None` once past the newest entry.
    pub fn recall_next(&mut self) -> Option<&str> {
        let index = self.cursor? + 1;
        if index >= self.entries.len() {
            self.cursor = None;
            return None;
        }
        self.cursor = Some(index);
        self.entries.get(index).map(String::as_str)
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = None;
    }

    /// Entry by its printed number (1-based).
    pub fn event(&self, number: usize) -> Option<&str> {
        let index = number.checked_sub(self.offset + 1)?;
        self.entries.get(index).map(String::as_str)
    }

    /// `n`-th entry counting back from the newest (1 = newest).
    pub fn event_from_end(&self, n: usize) -> Option<&str> {
        let index = self.entries.len().checked_sub(n)?;
        if n == 0 {
            return None;
        }
        self.entries.get(index).map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// `(number, line)` pairs, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = (usize, &str)> {
        let offset = self.offset;
        self.entries
            .iter()
            .enumerate()
            .map(move |(i, line)| (offset + i + 1, line.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.offset += self.entries.len();
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(lines: &[&str]) -> HistoryBuffer {
        let mut history = HistoryBuffer::new(10);
        for line in lines {
            history.push(line);
        }
        history
    }

    #[test]
    fn test_recall_previous_and_next() {
        let mut h = history(&["ls", "pwd", "cd /"]);
        assert_eq!(h.recall_previous(), Some("cd /"));
        assert_eq!(h.recall_previous(), Some("pwd"));
        assert_eq!(h.recall_previous(), Some("ls"));
        assert_eq!(h.recall_previous(), Some("ls"));
        assert_eq!(h.recall_next(), Some("pwd"));
        assert_eq!(h.recall_next(), Some("cd /"));
        assert_eq!(h.recall_next(), None);
        assert_eq!(h.recall_next(), None);
    }

    #[test]
    fn test_push_resets_cursor() {
        let mut h = history(&["a", "b"]);
        h.recall_previous();
        h.recall_previous();
        h.push("c");
        assert_eq!(h.recall_previous(), Some("c"));
    }

    #[test]
    fn test_blank_lines_ignored() {
        let h = history(&["a", "   ", ""]);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_empty_recall() {
        let mut h = HistoryBuffer::new(5);
        assert_eq!(h.recall_previous(), None);
        assert_eq!(h.recall_next(), None);
    }

    #[test]
    fn test_numbering_survives_eviction() {
        let mut h = HistoryBuffer::new(2);
        h.push("one");
        h.push("two");
        h.push("three");
        let numbered: Vec<_> = h.entries().collect();
        assert_eq!(numbered, vec![(2, "two"), (3, "three")]);
        assert_eq!(h.event(1), None);
        assert_eq!(h.event(3), Some("three"));
    }

    #[test]
    fn test_event_from_end() {
        let h = history(&["a", "b", "c"]);
        assert_eq!(h.event_from_end(1), Some("c"));
        assert_eq!(h.event_from_end(3), Some("a"));
        assert_eq!(h.event_from_end(4), None);
        assert_eq!(h.event_from_end(0), None);
    }

    #[test]
    fn test_clear_keeps_numbering() {
        let mut h = history(&["a", "b"]);
        h.clear();
        assert!(h.is_empty());
        h.push("c");
        assert_eq!(h.entries().next(), Some((3, "c")));
    }
}
