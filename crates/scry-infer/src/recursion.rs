//! Recursion guards for on-demand definition building.
//!
//! Building one unit's definition may require building the definitions of
//! every unit it calls, recursively. Two guards bound that work:
//!
//! - [`RecursionGuard`]: cycle detection over unit identifiers plus depth
//!   and total-work limits. Cycles are normally already broken by `Shallow`
//!   index entries; the guard is the second line for units that never get
//!   one (e.g. a hook re-entering the engine).
//! - [`DepthCounter`]: nesting limit for expression trees, which may
//!   legitimately revisit the same node.
//!
//! Denied entries are not errors: the caller serves the unit's shallow
//! signature, or `unknown`, and carries on.

use rustc_hash::FxHashSet;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Nested definition builds triggered by call sites.
    ///
    /// depth = 64, iterations = 100,000
    UnitAnalysis,

    /// Nesting of a single expression tree.
    ///
    /// depth = 256
    ExpressionNesting,

    /// Custom limits, e.g. from `InferConfig::max_call_depth`.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::UnitAnalysis => 64,
            Self::ExpressionNesting => 256,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::UnitAnalysis | Self::ExpressionNesting => 100_000,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    /// Proceed with the computation.
    Entered,
    /// The key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Cycle detection, depth limiting and iteration bounding.
///
/// Every successful [`enter`](Self::enter) must be paired with exactly one
/// [`leave`](Self::leave) for the same key.
#[derive(Debug)]
pub struct RecursionGuard<K: Hash + Eq + Clone> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
}

impl<K: Hash + Eq + Clone> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    pub fn enter(&mut self, key: &K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            return RecursionResult::DepthExceeded;
        }
        if self.visiting.contains(key) {
            return RecursionResult::Cycle;
        }

        self.visiting.insert(key.clone());
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: &K) {
        let was_present = self.visiting.remove(key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not in the visiting set"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Forget all state but keep the limits. Used after a unit failed
    /// mid-analysis and left entries behind.
    pub fn reset(&mut self) {
        self.visiting.clear();
        self.depth = 0;
        self.iterations = 0;
    }
}

// ---------------------------------------------------------------------------
// DepthCounter
// ---------------------------------------------------------------------------

/// Depth-only guard; no key tracking.
#[derive(Debug)]
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
}

impl DepthCounter {
    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self {
            depth: 0,
            max_depth: profile.max_depth(),
        }
    }

    /// Returns `false` (without entering) when the limit is reached.
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            return false;
        }
        self.depth += 1;
        true
    }

    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
