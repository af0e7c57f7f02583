//! Line index derived from editor text.

use std::iter::FusedIterator;
use std::ops::RangeInclusive;

/// Number of lines in a text buffer, always at least one.
///
/// An empty buffer still shows line `1` in the gutter, and a trailing
/// newline opens a new (empty) line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineIndex {
    count: usize,
}

impl LineIndex {
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        // `split` yields one more piece than there are separators, so the
        // empty string already counts as one line.
        Self {
            count: text.split('\n').count(),
        }
    }

    #[must_use]
    pub const fn count(self) -> usize {
        self.count
    }

    /// Lazy labels `1..=count`. Calling this again restarts the sequence.
    #[must_use]
    pub fn labels(self) -> LineLabels {
        LineLabels {
            range: 1..=self.count,
        }
    }

    /// Width in columns of the widest label.
    #[must_use]
    pub fn label_width(self) -> usize {
        self.count.to_string().len()
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self { count: 1 }
    }
}

/// Iterator over gutter labels.
#[derive(Debug, Clone)]
pub struct LineLabels {
    range: RangeInclusive<usize>,
}

impl Iterator for LineLabels {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.range.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<usize> {
        self.range.nth(n)
    }
}

impl DoubleEndedIterator for LineLabels {
    fn next_back(&mut self) -> Option<usize> {
        self.range.next_back()
    }
}

impl ExactSizeIterator for LineLabels {}

impl FusedIterator for LineLabels {}
