use std::ops::Range;

use crate::scene::NodeId;

/// One sampled location of a drawn line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineEntry {
    pub point: NodeId,
    /// Connector from the previous point of the same line. The first point of
    /// every line has none.
    pub segment: Option<NodeId>,
    /// Narration time in seconds at which the point was drawn.
    pub recording_time: f64,
}

/// A finalised line: its group node and the store entries it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct LineGroup {
    pub group: NodeId,
    pub entries: Range<usize>,
}

/// Ordered history of every point drawn during the session, across all
/// lines. Creation order is playback order.
#[derive(Debug, Default)]
pub struct LineStore {
    entries: Vec<LineEntry>,
    lines: Vec<LineGroup>,
}

impl LineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LineEntry) {
        if let Some(last) = self.entries.last() {
            debug_assert!(
                entry.recording_time >= last.recording_time,
                "recording time went backwards"
            );
        }
        self.entries.push(entry);
    }

    pub fn get(&self, index: usize) -> Option<&LineEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[LineEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.segment.is_some())
            .count()
    }

    /// Registers the entries from `first_entry` to the end as one line
    /// grouped under `group`.
    pub fn finish_line(&mut self, group: NodeId, first_entry: usize) {
        self.lines.push(LineGroup {
            group,
            entries: first_entry..self.entries.len(),
        });
    }

    pub fn lines(&self) -> &[LineGroup] {
        &self.lines
    }
}
