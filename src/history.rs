//! Bounded undo/redo log and input debouncing.
//!
//! The log stores full document snapshots. Pushing while not at the tip
//! discards the redo branch; pushing past capacity evicts the oldest
//! entry. After every push the cursor sits on the newest snapshot, so
//! `index == len - 1` holds unconditionally.

use serde::{Deserialize, Serialize};

use crate::selection::SelectionPath;

/// One recorded document state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub html: String,
    pub selection: Option<SelectionPath>,
    /// Milliseconds since an engine-defined epoch; informational only.
    pub timestamp_ms: u64,
}

/// Bounded, branch-discarding history of [`Snapshot`]s.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    snapshots: Vec<Snapshot>,
    /// Cursor into `snapshots`; `None` while the log is empty.
    index: Option<usize>,
    max_size: usize,
}

impl HistoryLog {
    /// `max_size` is clamped to at least 1.
    pub fn new(max_size: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            index: None,
            max_size: max_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The snapshot under the cursor.
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.index?)
    }

    pub fn can_undo(&self) -> bool {
        matches!(self.index, Some(i) if i > 0)
    }

    pub fn can_redo(&self) -> bool {
        matches!(self.index, Some(i) if i + 1 < self.snapshots.len())
    }

    /// Record a snapshot. A snapshot whose HTML matches the current one is
    /// skipped, so repeated no-op commits cannot flood the log.
    pub fn push(&mut self, snapshot: Snapshot) {
        if let Some(current) = self.current() {
            if current.html == snapshot.html {
                return;
            }
        }
        if let Some(i) = self.index {
            self.snapshots.truncate(i + 1);
        }
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.max_size {
            self.snapshots.remove(0);
        }
        self.index = Some(self.snapshots.len() - 1);
        tracing::debug!(
            len = self.snapshots.len(),
            index = ?self.index,
            "history push"
        );
    }

    /// Step the cursor back and return the snapshot it lands on.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        let i = self.index?;
        if i == 0 {
            return None;
        }
        self.index = Some(i - 1);
        self.snapshots.get(i - 1)
    }

    /// Step the cursor forward and return the snapshot it lands on.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        let i = self.index?;
        if i + 1 >= self.snapshots.len() {
            return None;
        }
        self.index = Some(i + 1);
        self.snapshots.get(i + 1)
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.index = None;
    }
}

/// Coalesces rapid input events into one pending snapshot deadline.
///
/// Poll-driven: the caller supplies the clock, so the engine stays free of
/// timer threads and tests control time directly.
#[derive(Debug, Clone)]
pub struct InputDebounce {
    window: std::time::Duration,
    deadline: Option<std::time::Instant>,
}

impl InputDebounce {
    pub fn new(window: std::time::Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Note an input event; (re)arms the deadline one window from `now`.
    pub fn record(&mut self, now: std::time::Instant) {
        self.deadline = Some(now + self.window);
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// If the deadline has passed, disarm and report it. At most one
    /// snapshot results from any burst of recorded events.
    pub fn take_due(&mut self, now: std::time::Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn snap(html: &str) -> Snapshot {
        Snapshot {
            html: html.to_string(),
            selection: None,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_push_and_cursor() {
        let mut log = HistoryLog::new(10);
        assert!(log.is_empty());
        assert!(!log.can_undo());
        log.push(snap("a"));
        log.push(snap("b"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.index(), Some(1));
        assert_eq!(log.current().unwrap().html, "b");
        assert!(log.can_undo());
        assert!(!log.can_redo());
    }

    #[test]
    fn test_duplicate_skipped() {
        let mut log = HistoryLog::new(10);
        log.push(snap("a"));
        log.push(snap("a"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_undo_redo_walk() {
        let mut log = HistoryLog::new(10);
        log.push(snap("a"));
        log.push(snap("b"));
        log.push(snap("c"));
        assert_eq!(log.undo().unwrap().html, "b");
        assert_eq!(log.undo().unwrap().html, "a");
        assert!(log.undo().is_none());
        assert_eq!(log.redo().unwrap().html, "b");
        assert_eq!(log.redo().unwrap().html, "c");
        assert!(log.redo().is_none());
    }

    #[test]
    fn test_push_discards_redo_branch() {
        let mut log = HistoryLog::new(10);
        log.push(snap("a"));
        log.push(snap("b"));
        log.push(snap("c"));
        log.undo();
        log.undo();
        log.push(snap("d"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.current().unwrap().html, "d");
        assert!(!log.can_redo());
        assert_eq!(log.undo().unwrap().html, "a");
    }

    #[test]
    fn test_capacity_eviction_keeps_cursor_at_tip() {
        let mut log = HistoryLog::new(3);
        log.push(snap("a"));
        log.push(snap("b"));
        log.push(snap("c"));
        log.push(snap("d"));
        assert_eq!(log.len(), 3);
        assert_eq!(log.index(), Some(2));
        assert_eq!(log.current().unwrap().html, "d");
        assert_eq!(log.undo().unwrap().html, "c");
        assert_eq!(log.undo().unwrap().html, "b");
        assert!(log.undo().is_none());
    }

    #[test]
    fn test_max_size_clamped_to_one() {
        let mut log = HistoryLog::new(0);
        assert_eq!(log.max_size(), 1);
        log.push(snap("a"));
        log.push(snap("b"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.current().unwrap().html, "b");
    }

    #[test]
    fn test_clear() {
        let mut log = HistoryLog::new(5);
        log.push(snap("a"));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.index(), None);
        assert!(log.current().is_none());
    }

    #[test]
    fn test_debounce_coalesces_burst() {
        let mut debounce = InputDebounce::new(Duration::from_millis(300));
        let start = Instant::now();
        debounce.record(start);
        debounce.record(start + Duration::from_millis(100));
        debounce.record(start + Duration::from_millis(200));
        assert!(!debounce.take_due(start + Duration::from_millis(400)));
        assert!(debounce.take_due(start + Duration::from_millis(500)));
        assert!(!debounce.is_pending());
        assert!(!debounce.take_due(start + Duration::from_millis(600)));
    }

    #[test]
    fn test_debounce_not_due_early() {
        let mut debounce = InputDebounce::new(Duration::from_millis(300));
        let start = Instant::now();
        debounce.record(start);
        assert!(debounce.is_pending());
        assert!(!debounce.take_due(start + Duration::from_millis(299)));
        assert!(debounce.is_pending());
    }

    #[test]
    fn test_debounce_clear_disarms() {
        let mut debounce = InputDebounce::new(Duration::from_millis(300));
        let start = Instant::now();
        debounce.record(start);
        debounce.clear();
        assert!(!debounce.take_due(start + Duration::from_secs(1)));
    }
}
