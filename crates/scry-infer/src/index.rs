//! Definition index: memoized definitions with a two-state maturity.
//!
//! | Maturity | Built from | Served when |
//! |----------|------------|-------------|
//! | `Shallow` | declared signature and doc tags | the unit's body is still being analysed |
//! | `Full` | signature, body dataflow and extensions | always, once complete |
//!
//! A unit gets a `Shallow` entry before its body is analysed, so recursive
//! and mutually recursive references observe the signature instead of
//! re-entering the analysis. Entries are never evicted during a run;
//! `reset` clears everything between independent runs.
//!
//! A unit whose analysis panicked is completed with its signature and the
//! failure reason, so later requests degrade to the signature instead of
//! re-running the failing analysis.
//!
//! The index is owned by one analysis thread. It uses interior mutability
//! so that the engine, scopes and hooks can share it by reference.

use std::cell::RefCell;

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::definition::{FunctionLikeDefinition, UnitId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Maturity {
    Shallow,
    Full,
}

#[derive(Clone, Debug)]
pub struct IndexEntry {
    pub maturity: Maturity,
    pub definition: FunctionLikeDefinition,
    /// Why the body analysis failed, for units completed by `fail`.
    pub failure: Option<String>,
}

impl IndexEntry {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[derive(Debug, Default)]
pub struct DefinitionIndex {
    entries: RefCell<FxHashMap<UnitId, IndexEntry>>,
}

impl DefinitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, unit: &UnitId) -> Option<IndexEntry> {
        self.entries.borrow().get(&unit.normalized()).cloned()
    }

    pub fn maturity(&self, unit: &UnitId) -> Option<Maturity> {
        self.entries
            .borrow()
            .get(&unit.normalized())
            .map(|entry| entry.maturity)
    }

    pub fn contains(&self, unit: &UnitId) -> bool {
        self.entries.borrow().contains_key(&unit.normalized())
    }

    /// Insert a signature-only placeholder. An existing entry is kept.
    pub fn insert_shallow(&self, unit: &UnitId, definition: FunctionLikeDefinition) {
        let mut entries = self.entries.borrow_mut();
        entries
            .entry(unit.normalized())
            .or_insert_with(|| IndexEntry {
                maturity: Maturity::Shallow,
                definition,
                failure: None,
            });
        trace!(unit = %unit, "index: shallow entry");
    }

    /// Store the body-analysed definition, replacing any placeholder.
    pub fn complete(&self, unit: &UnitId, definition: FunctionLikeDefinition) {
        self.entries.borrow_mut().insert(
            unit.normalized(),
            IndexEntry {
                maturity: Maturity::Full,
                definition,
                failure: None,
            },
        );
        trace!(unit = %unit, "index: full entry");
    }

    /// Complete `unit` with its signature after a failed body analysis.
    pub fn fail(&self, unit: &UnitId, signature: FunctionLikeDefinition, reason: String) {
        trace!(unit = %unit, reason = %reason, "index: failed entry");
        self.entries.borrow_mut().insert(
            unit.normalized(),
            IndexEntry {
                maturity: Maturity::Full,
                definition: signature,
                failure: Some(reason),
            },
        );
    }

    /// The recorded failure of `unit`, if its analysis failed.
    pub fn failure(&self, unit: &UnitId) -> Option<String> {
        self.entries
            .borrow()
            .get(&unit.normalized())
            .and_then(|entry| entry.failure.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn reset(&self) {
        self.entries.borrow_mut().clear();
    }
}

#[cfg(test)]
#[path = "../tests/index_tests.rs"]
mod tests;
