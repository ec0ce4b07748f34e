//! Literal widening.
//!
//! Collapses literal refinements to their base types so that merging many
//! branches does not produce an ever-growing union of literals:
//! `int(1)|int(2)|string(a)` widens to `int|string`.

use crate::types::Type;
use crate::union::Union;

impl Type {
    /// Generalise literals to their base type. Idempotent.
    pub fn widen(&self) -> Type {
        match self {
            Type::Literal(literal) => literal.base(),
            Type::Union(union) => Union::wrap(union.iter().map(Type::widen)),
            other => other.clone(),
        }
    }
}
