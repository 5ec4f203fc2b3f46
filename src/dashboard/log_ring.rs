//! Bounded, newest-first log feed with visibility-gated redraws.
//!
//! Pushes always land in the buffer. The rendered text is only refreshed
//! while visible; after a hidden period the owner calls [`LogRing::render`]
//! once to catch up.

#![allow(missing_docs)]

use std::collections::VecDeque;

use crate::core::model::Visibility;

/// Maximum number of retained lines.
pub const LOG_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct LogRing {
    lines: VecDeque<String>,
    capacity: usize,
    rendered: String,
    redraws: u64,
}

impl Default for LogRing {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl LogRing {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A ring with a custom bound; zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
            rendered: String::new(),
            redraws: 0,
        }
    }

    /// Insert `line` at the front, evicting the oldest line when full.
    /// Returns whether the visible text was redrawn.
    pub fn push(&mut self, line: impl Into<String>, visibility: Visibility) -> bool {
        if self.lines.len() >= self.capacity {
            self.lines.pop_back();
        }
        self.lines.push_front(line.into());
        if visibility.is_visible() {
            self.render();
            true
        } else {
            false
        }
    }

    /// Rebuild the visible text from the buffer unconditionally.
    pub fn render(&mut self) -> &str {
        self.rendered = self.lines().collect::<Vec<_>>().join("\n");
        self.redraws += 1;
        &self.rendered
    }

    /// Text as of the last redraw.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.rendered
    }

    /// Lines, newest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub const fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Drop all lines and the rendered text.
    pub fn reset(&mut self) {
        self.lines.clear();
        self.rendered.clear();
        self.redraws = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_line_is_first() {
        let mut ring = LogRing::new();
        ring.push("one", Visibility::Visible);
        ring.push("two", Visibility::Visible);
        assert_eq!(ring.text(), "two\none");
    }

    #[test]
    fn eviction_starts_at_capacity() {
        let mut ring = LogRing::new();
        for i in 0..LOG_CAPACITY {
            ring.push(i.to_string(), Visibility::Hidden);
        }
        assert_eq!(ring.len(), LOG_CAPACITY);
        assert_eq!(ring.lines().last(), Some("0"));
        ring.push("new", Visibility::Hidden);
        assert_eq!(ring.len(), LOG_CAPACITY);
        assert_eq!(ring.lines().next(), Some("new"));
        assert_eq!(ring.lines().last(), Some("1"));
    }

    #[test]
    fn hidden_pushes_defer_redraw_but_keep_data() {
        let mut ring = LogRing::new();
        assert!(ring.push("visible", Visibility::Visible));
        assert!(!ring.push("hidden", Visibility::Hidden));
        assert_eq!(ring.text(), "visible");
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.redraw_count(), 1);
        assert_eq!(ring.render(), "hidden\nvisible");
        assert_eq!(ring.redraw_count(), 2);
    }

    #[test]
    fn blank_separator_lines_are_kept() {
        let mut ring = LogRing::new();
        ring.push("a", Visibility::Visible);
        ring.push("", Visibility::Visible);
        ring.push("b", Visibility::Visible);
        assert_eq!(ring.text(), "b\n\na");
    }

    #[test]
    fn reset_empties_buffer() {
        let mut ring = LogRing::with_capacity(0);
        assert_eq!(ring.capacity(), 1);
        ring.push("x", Visibility::Visible);
        ring.push("y", Visibility::Visible);
        assert_eq!(ring.text(), "y");
        ring.reset();
        assert!(ring.is_empty());
        assert_eq!(ring.text(), "");
    }
}
