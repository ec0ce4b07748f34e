//! Return-type precedence.
//!
//! Up to three signals describe a unit's return type. The highest present
//! one wins:
//!
//! 1. **override** - the vendor override tag. Always adopted.
//! 2. **declared** - `@return` or the native hint. Adopted when the
//!    inferred type does not fit into it: the declaration is the contract.
//! 3. **inferred** - what the body returns.
//!
//! An override that failed to parse is not a signal; the engine reports it
//! as `IncompatibleOverride` and the next level applies.

use scry_types::{ClassHierarchy, Type};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReturnSignals {
    pub override_return: Option<Type>,
    pub declared: Option<Type>,
    pub inferred: Option<Type>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnSource {
    Override,
    Declared,
    Inferred,
    /// No signal at all; the type is `unknown`.
    Missing,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub ty: Type,
    pub source: ReturnSource,
}

pub fn select_return(signals: ReturnSignals, hierarchy: &dyn ClassHierarchy) -> Selection {
    let ReturnSignals {
        override_return,
        declared,
        inferred,
    } = signals;

    if let Some(ty) = override_return {
        return Selection {
            ty,
            source: ReturnSource::Override,
        };
    }

    match (declared, inferred) {
        (Some(declared), Some(inferred)) => {
            if declared.accepts_in(&inferred, hierarchy) {
                Selection {
                    ty: inferred,
                    source: ReturnSource::Inferred,
                }
            } else {
                Selection {
                    ty: declared,
                    source: ReturnSource::Declared,
                }
            }
        }
        (Some(declared), None) => Selection {
            ty: declared,
            source: ReturnSource::Declared,
        },
        (None, Some(inferred)) => Selection {
            ty: inferred,
            source: ReturnSource::Inferred,
        },
        (None, None) => Selection {
            ty: Type::Unknown,
            source: ReturnSource::Missing,
        },
    }
}

#[cfg(test)]
#[path = "../tests/precedence_tests.rs"]
mod tests;
