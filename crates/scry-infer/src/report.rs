//! Run-level result: built definitions plus every collected failure.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::definition::{FunctionLikeDefinition, UnitId};
use crate::error::InferError;

#[derive(Debug, Default, Serialize)]
pub struct AnalysisReport {
    /// Requested units in request order.
    pub definitions: IndexMap<UnitId, FunctionLikeDefinition>,
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<InferError>,
}

impl AnalysisReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn definition(&self, unit: &UnitId) -> Option<&FunctionLikeDefinition> {
        self.definitions.get(unit)
    }

    /// Failures attributed to `unit`.
    pub fn failures_for<'a>(&'a self, unit: &'a UnitId) -> impl Iterator<Item = &'a InferError> {
        self.failures
            .iter()
            .filter(move |failure| failure.unit().normalized() == unit.normalized())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn serialize_failures<S: Serializer>(failures: &[InferError], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(failures.iter().map(ToString::to_string))
}

#[cfg(test)]
#[path = "../tests/report_tests.rs"]
mod tests;
