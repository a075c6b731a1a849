//! Request/response metadata threaded through every dispatch hop.

use serde::{Deserialize, Serialize};

/// Per-request metadata carried on every dispatch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverMeta {
    /// Opaque revision token from the storage layer's revision algebra.
    pub at_revision: String,
    /// Strictly positive; decremented at every dispatch hop. Reaching zero
    /// before a hop completes is a fatal `DEPTH_EXCEEDED` for that sub-request.
    pub depth_remaining: u32,
}

impl ResolverMeta {
    #[must_use]
    pub fn new(at_revision: impl Into<String>, depth_remaining: u32) -> Self {
        Self {
            at_revision: at_revision.into(),
            depth_remaining,
        }
    }

    /// Returns the metadata for the next hop with depth decremented by one,
    /// or `None` if the budget is already exhausted. The caller (the
    /// dispatcher) is responsible for turning `None` into `DEPTH_EXCEEDED`.
    #[must_use]
    pub fn descend(&self) -> Option<Self> {
        self.depth_remaining.checked_sub(1).map(|remaining| Self {
            at_revision: self.at_revision.clone(),
            depth_remaining: remaining,
        })
    }
}

/// Accumulated metadata returned alongside every dispatch response. Sums are
/// additive over sub-results; `depth_required` is a high-water mark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub dispatch_count: u64,
    pub cached_dispatch_count: u64,
    pub depth_required: u32,
}

impl ResponseMeta {
    #[must_use]
    pub fn single_dispatch(cached: bool, depth_required: u32) -> Self {
        Self {
            dispatch_count: 1,
            cached_dispatch_count: u64::from(cached),
            depth_required,
        }
    }

    /// Merge a sub-call's metadata into this one: counters add, depth takes
    /// the maximum.
    pub fn merge(&mut self, other: &ResponseMeta) {
        self.dispatch_count += other.dispatch_count;
        self.cached_dispatch_count += other.cached_dispatch_count;
        self.depth_required = self.depth_required.max(other.depth_required);
    }

    #[must_use]
    pub fn merged(mut self, other: &ResponseMeta) -> Self {
        self.merge(other);
        self
    }

    /// `dispatch_count >= cached_dispatch_count` always holds.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.dispatch_count >= self.cached_dispatch_count
    }
}

/// How verbose a debug trace attached to `ResponseMeta` should be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebugSetting {
    #[default]
    NoDebug,
    Basic,
    Full,
}

/// One node of a debug trace mirroring the rewrite tree actually evaluated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebugTraceNode {
    pub label: String,
    pub resource: String,
    pub cached: bool,
    pub children: Vec<DebugTraceNode>,
}

impl DebugTraceNode {
    #[must_use]
    pub fn leaf(label: impl Into<String>, resource: impl Into<String>, cached: bool) -> Self {
        Self {
            label: label.into(),
            resource: resource.into(),
            cached,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descend_exhausts_at_zero() {
        let meta = ResolverMeta::new("rev-1", 1);
        let next = meta.descend().expect("one hop left");
        assert_eq!(next.depth_remaining, 0);
        assert!(next.descend().is_none());
    }

    #[test]
    fn merge_sums_counts_and_maxes_depth() {
        let mut a = ResponseMeta {
            dispatch_count: 2,
            cached_dispatch_count: 1,
            depth_required: 3,
        };
        let b = ResponseMeta {
            dispatch_count: 5,
            cached_dispatch_count: 0,
            depth_required: 7,
        };
        a.merge(&b);
        assert_eq!(a.dispatch_count, 7);
        assert_eq!(a.cached_dispatch_count, 1);
        assert_eq!(a.depth_required, 7);
        assert!(a.is_well_formed());
    }
}
