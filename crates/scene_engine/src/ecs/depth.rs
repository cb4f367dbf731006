//! Depth ordering with a deterministic tie-break
//!
//! Entities sharing a requested depth are ordered by arrival: each depth keeps
//! a counter, and every assignment takes the next value. The pair
//! `(depth, tie)` is compared as integers so ordering never drifts.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Requested depth plus its tie-break within the bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActualDepth {
    depth: i32,
    tie: u64,
}

impl ActualDepth {
    pub(crate) fn new(depth: i32, tie: u64) -> Self {
        Self { depth, tie }
    }

    /// Requested depth
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Position within the depth bucket, 0 for the first arrival
    pub fn tie(&self) -> u64 {
        self.tie
    }

    /// Fractional view: `depth - tie * epsilon`
    pub fn value(&self, epsilon: f64) -> f64 {
        f64::from(self.depth) - self.tie as f64 * epsilon
    }
}

impl Ord for ActualDepth {
    /// Later arrivals in a bucket compare lower, matching `depth - tie * epsilon`
    fn cmp(&self, other: &Self) -> Ordering {
        self.depth
            .cmp(&other.depth)
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

impl PartialOrd for ActualDepth {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Per-depth arrival counters of one scene
#[derive(Debug, Clone)]
pub struct DepthOrdering {
    buckets: HashMap<i32, u64>,
    epsilon: f64,
}

impl DepthOrdering {
    /// Create an ordering whose fractional view uses `epsilon`
    pub fn new(epsilon: f64) -> Self {
        Self { buckets: HashMap::new(), epsilon }
    }

    /// Take the next tie-break for `depth`
    pub fn assign(&mut self, depth: i32) -> ActualDepth {
        let counter = self.buckets.entry(depth).or_insert(0);
        let tie = *counter;
        *counter += 1;
        ActualDepth { depth, tie }
    }

    /// Assignments made so far at `depth`
    pub fn assigned(&self, depth: i32) -> u64 {
        self.buckets.get(&depth).copied().unwrap_or(0)
    }

    /// Fractional value of `actual`
    pub fn value(&self, actual: ActualDepth) -> f64 {
        actual.value(self.epsilon)
    }

    /// Forget every bucket
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}
