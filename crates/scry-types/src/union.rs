//! Normalised OR-types.
//!
//! A `Union` always has at least two pairwise distinct members and never
//! contains another union. The only way to build one is `Union::wrap`, which
//! enforces that:
//!
//! - nested unions are flattened into their members
//! - duplicates (by canonical rendering) are dropped, first occurrence wins
//! - zero members collapse to `void`, one member is returned unwrapped

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::types::Type;

type MemberBuffer = SmallVec<[Type; 4]>;

#[derive(Clone, Debug, PartialEq)]
pub struct Union {
    members: Vec<Type>,
}

impl Union {
    /// Canonical union constructor.
    pub fn wrap<I>(types: I) -> Type
    where
        I: IntoIterator<Item = Type>,
    {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut members: MemberBuffer = SmallVec::new();
        for ty in types {
            push_member(&mut members, &mut seen, ty);
        }

        match members.len() {
            0 => Type::Void,
            1 => members.pop().unwrap_or(Type::Void),
            _ => Type::Union(Union {
                members: members.into_vec(),
            }),
        }
    }

    pub fn members(&self) -> &[Type] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Type> {
        self.members.iter()
    }
}

impl<'a> IntoIterator for &'a Union {
    type Item = &'a Type;
    type IntoIter = std::slice::Iter<'a, Type>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

fn push_member(members: &mut MemberBuffer, seen: &mut FxHashSet<String>, ty: Type) {
    if let Type::Union(inner) = ty {
        for member in inner.members {
            push_member(members, seen, member);
        }
        return;
    }
    if seen.insert(ty.to_string()) {
        members.push(ty);
    }
}

#[cfg(test)]
#[path = "../tests/union_tests.rs"]
mod tests;
