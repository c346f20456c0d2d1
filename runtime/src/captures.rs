use crate::slots::ABSENT;

/// Represents a defined match group for a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveGroupSlot {
    #[default]
    None,
    Complete {
        start: usize,
        end: usize,
    },
}

impl SaveGroupSlot {
    /// Returns a boolean representing if the savegroup slot is of the `None`
    /// variant, signifying a match was not found.
    pub fn is_none(&self) -> bool {
        matches!(self, SaveGroupSlot::None)
    }

    /// Returns a boolean representing if the savegroup slot is of the
    /// `Complete` variant, signifying a match was found.
    pub fn is_complete(&self) -> bool {
        !self.is_none()
    }

    /// Returns a completed save group from its constituent parts.
    pub const fn complete(start: usize, end: usize) -> Self {
        Self::Complete { start, end }
    }

    /// Returns the `(start, end)` offsets of a completed group.
    pub fn span(&self) -> Option<(usize, usize)> {
        match self {
            SaveGroupSlot::None => None,
            SaveGroupSlot::Complete { start, end } => Some((*start, *end)),
        }
    }

    /// Returns the code-unit range of a completed group.
    pub fn as_range(&self) -> Option<std::ops::Range<usize>> {
        self.span().map(|(start, end)| start..end)
    }
}

/// The result of a successful match or search.
///
/// Offsets are code-unit offsets into the input the program was run against.
/// Group 0 is always present and spans the whole match. Groups 1.. are the
/// save-point groups in the lexical order of their opening save point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures {
    slots: Vec<usize>,
}

impl Captures {
    /// Wraps a raw slot array, returning `None` if it does not hold a
    /// complete group 0.
    pub fn from_slots(slots: Vec<usize>) -> Option<Self> {
        match slots.get(0..2) {
            Some(&[start, end]) if start != ABSENT && end != ABSENT && start <= end => {
                Some(Self { slots })
            }
            _ => None,
        }
    }

    /// The `(start, end)` span of the whole match.
    pub fn whole_span(&self) -> (usize, usize) {
        (self.slots[0], self.slots[1])
    }

    /// The number of groups, including group 0.
    pub fn group_count(&self) -> usize {
        self.slots.len() / 2
    }

    /// Returns the span of group `idx`, or `SaveGroupSlot::None` if the group
    /// did not participate in the match or does not exist.
    pub fn group(&self, idx: usize) -> SaveGroupSlot {
        let start = self.slots.get(idx * 2).copied().unwrap_or(ABSENT);
        let end = self.slots.get(idx * 2 + 1).copied().unwrap_or(ABSENT);

        if start == ABSENT || end == ABSENT || start > end {
            SaveGroupSlot::None
        } else {
            SaveGroupSlot::complete(start, end)
        }
    }

    /// Returns an iterator over every group, in index order.
    pub fn groups(&self) -> impl Iterator<Item = SaveGroupSlot> + '_ {
        (0..self.group_count()).map(|idx| self.group(idx))
    }

    /// Returns the sub-view of `input` covered by group `idx`.
    pub fn group_units<'a, T>(&self, idx: usize, input: &'a [T]) -> Option<&'a [T]> {
        self.group(idx).as_range().and_then(|range| input.get(range))
    }

    /// Returns the substring of `input` covered by group `idx`, assuming the
    /// captures were produced by a run over the UTF-8 bytes of `input`.
    pub fn group_str<'a>(&self, idx: usize, input: &'a str) -> Option<&'a str> {
        self.group(idx).as_range().and_then(|range| input.get(range))
    }
}
