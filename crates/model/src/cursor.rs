//! Cursors: opaque, resumable positions in a streaming result.

use serde::{Deserialize, Serialize};

/// An ordered sequence of opaque section strings, one per level of recursion
/// the producing resolver maintains, plus a version tag. Cursors are
/// strictly increasing in a lexicographic/structural sense within one query
/// and are totally opaque to clients. The string grammar used to flatten a
/// `Cursor` to/from wire bytes lives in `rebac-stream`, which owns the
/// versioned encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub sections: Vec<String>,
    pub dispatch_version: u32,
}

impl Cursor {
    #[must_use]
    pub fn start(dispatch_version: u32) -> Self {
        Self {
            sections: Vec::new(),
            dispatch_version,
        }
    }

    #[must_use]
    pub fn is_start(&self) -> bool {
        self.sections.is_empty()
    }

    /// `true` when this cursor was minted under a different encoding version
    /// than the one current now; mismatched cursors are treated as absent
    /// rather than erroring.
    #[must_use]
    pub fn is_stale(&self, current_version: u32) -> bool {
        self.dispatch_version != current_version
    }

    #[must_use]
    pub fn at_level(&self, level: usize) -> Option<&str> {
        self.sections.get(level).map(String::as_str)
    }

    #[must_use]
    pub fn pushed(&self, section: impl Into<String>) -> Self {
        let mut sections = self.sections.clone();
        sections.push(section.into());
        Self {
            sections,
            dispatch_version: self.dispatch_version,
        }
    }
}
