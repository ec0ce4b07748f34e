//! Assignability and structural equality.
//!
//! `a.accepts(b)` answers "can a value of type `b` be used where `a` is
//! expected?". `accepted_by` is its mirror. Both are defined for every pair
//! of types:
//!
//! - a union *source* is accepted only if every member is accepted
//! - a union *target* accepts a source if any member does
//! - `unknown` accepts everything and is accepted only by `unknown`
//! - `mixed` accepts everything except `unknown` and `void`
//! - literals are accepted by their base type and by an equal literal
//! - `float` accepts `int`
//! - object types consult a `ClassHierarchy` (exact names without one)
//! - generic arguments are covariant, function parameters contravariant
//!
//! `is_same` is deep structural equality. Ordered containers compare in
//! order; unions and exception sets compare as multisets.

use crate::keyed_array::KeyedArrayType;
use crate::types::{ArrayType, FunctionType, Generic, LiteralType, TemplateType, Type};

/// Nominal subclass relation between canonical class names.
pub trait ClassHierarchy {
    /// True when `child` is `ancestor` or extends/implements/uses it.
    fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool;
}

/// Hierarchy that knows nothing: a class is only a subclass of itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHierarchy;

impl ClassHierarchy for NoHierarchy {
    fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool {
        same_class_name(child, ancestor)
    }
}

impl<T: ClassHierarchy + ?Sized> ClassHierarchy for &T {
    fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool {
        (**self).is_subclass_of(child, ancestor)
    }
}

/// Class names compare case-insensitively and ignore a leading `\`.
pub fn same_class_name(a: &str, b: &str) -> bool {
    a.trim_start_matches('\\')
        .eq_ignore_ascii_case(b.trim_start_matches('\\'))
}

/// Object names that accept any callable value.
const CALLABLE_CLASSES: &[&str] = &["Closure", "callable"];

impl Type {
    pub fn accepts(&self, other: &Type) -> bool {
        self.accepts_in(other, &NoHierarchy)
    }

    pub fn accepted_by(&self, other: &Type) -> bool {
        other.accepts(self)
    }

    pub fn accepted_by_in(&self, other: &Type, hierarchy: &dyn ClassHierarchy) -> bool {
        other.accepts_in(self, hierarchy)
    }

    pub fn accepts_in(&self, other: &Type, hierarchy: &dyn ClassHierarchy) -> bool {
        if let Type::Union(union) = other {
            return union
                .iter()
                .all(|member| self.accepts_in(member, hierarchy));
        }

        match self {
            Type::Unknown => return true,
            Type::Mixed => return !matches!(other, Type::Unknown | Type::Void),
            Type::Union(union) => {
                return union
                    .iter()
                    .any(|member| member.accepts_in(other, hierarchy));
            }
            Type::Template(template) => return template_accepts(template, other, hierarchy),
            _ => {}
        }

        match other {
            Type::Unknown => return false,
            Type::Template(template) => {
                let bound = template.bound.as_deref().unwrap_or(&Type::Mixed);
                return self.accepts_in(bound, hierarchy);
            }
            _ => {}
        }

        match (self, other) {
            (Type::Void, Type::Void)
            | (Type::Null, Type::Null)
            | (Type::Boolean, Type::Boolean)
            | (Type::Integer, Type::Integer)
            | (Type::Float, Type::Float | Type::Integer)
            | (Type::String, Type::String) => true,

            (Type::Boolean, Type::Literal(LiteralType::Boolean(_)))
            | (Type::Integer, Type::Literal(LiteralType::Integer(_)))
            | (Type::Float, Type::Literal(LiteralType::Float(_) | LiteralType::Integer(_)))
            | (Type::String, Type::Literal(LiteralType::String(_))) => true,

            (Type::Literal(target), Type::Literal(source)) => target == source,

            (Type::Array(target), Type::Array(source)) => {
                array_accepts_array(target, source, hierarchy)
            }
            (Type::Array(target), Type::KeyedArray(source)) => {
                array_accepts_shape(target, source, hierarchy)
            }
            (Type::KeyedArray(target), Type::KeyedArray(source)) => {
                shape_accepts_shape(target, source, hierarchy)
            }

            (Type::Object(target), Type::Function(_)) => CALLABLE_CLASSES
                .iter()
                .any(|name| same_class_name(&target.name, name)),
            (Type::Object(target), Type::Object(source)) => {
                hierarchy.is_subclass_of(&source.name, &target.name)
            }
            (Type::Object(target), Type::Generic(source)) => {
                hierarchy.is_subclass_of(&source.name, &target.name)
            }
            // A raw class reference is accepted where a parameterised one is
            // expected; its arguments are unknown.
            (Type::Generic(target), Type::Object(source)) => {
                hierarchy.is_subclass_of(&source.name, &target.name)
            }
            (Type::Generic(target), Type::Generic(source)) => {
                generic_accepts(target, source, hierarchy)
            }

            (Type::Function(target), Type::Function(source)) => {
                function_accepts(target, source, hierarchy)
            }

            _ => false,
        }
    }

    /// Deep structural equality.
    pub fn is_same(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Union(a), Type::Union(b)) => same_multiset(a.members(), b.members()),
            (Type::Literal(a), Type::Literal(b)) => a == b,
            (Type::Array(a), Type::Array(b)) => {
                a.is_list == b.is_list && a.key.is_same(&b.key) && a.value.is_same(&b.value)
            }
            (Type::KeyedArray(a), Type::KeyedArray(b)) => {
                a.len() == b.len()
                    && a.items().iter().zip(b.items()).all(|(x, y)| {
                        x.key == y.key && x.optional == y.optional && x.value.is_same(&y.value)
                    })
            }
            (Type::Object(a), Type::Object(b)) => same_class_name(&a.name, &b.name),
            (Type::Generic(a), Type::Generic(b)) => {
                same_class_name(&a.name, &b.name) && same_sequence(&a.args, &b.args)
            }
            (Type::Template(a), Type::Template(b)) => {
                a.name == b.name
                    && match (&a.bound, &b.bound) {
                        (None, None) => true,
                        (Some(x), Some(y)) => x.is_same(y),
                        _ => false,
                    }
            }
            (Type::Function(a), Type::Function(b)) => {
                a.params.len() == b.params.len()
                    && a.params.iter().zip(&b.params).all(|(x, y)| {
                        x.has_default == y.has_default
                            && x.variadic == y.variadic
                            && x.ty.is_same(&y.ty)
                    })
                    && a.return_type.is_same(&b.return_type)
                    && same_multiset(&a.exceptions, &b.exceptions)
            }
            (Type::Unknown, Type::Unknown)
            | (Type::Mixed, Type::Mixed)
            | (Type::Void, Type::Void)
            | (Type::Null, Type::Null)
            | (Type::Boolean, Type::Boolean)
            | (Type::Integer, Type::Integer)
            | (Type::Float, Type::Float)
            | (Type::String, Type::String) => true,
            _ => false,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn template_accepts(template: &TemplateType, other: &Type, hierarchy: &dyn ClassHierarchy) -> bool {
    if let Type::Template(source) = other {
        if source.name == template.name {
            return true;
        }
    }
    match &template.bound {
        Some(bound) => bound.accepts_in(other, hierarchy),
        None => !matches!(other, Type::Unknown | Type::Void),
    }
}

fn array_accepts_array(target: &ArrayType, source: &ArrayType, hierarchy: &dyn ClassHierarchy) -> bool {
    if target.is_list && !source.is_list {
        return false;
    }
    target.key.accepts_in(&source.key, hierarchy) && target.value.accepts_in(&source.value, hierarchy)
}

fn array_accepts_shape(
    target: &ArrayType,
    source: &KeyedArrayType,
    hierarchy: &dyn ClassHierarchy,
) -> bool {
    if target.is_list && !source.is_list() {
        return false;
    }
    source.items().iter().all(|item| {
        target.key.accepts_in(&item.key.key_type(), hierarchy)
            && target.value.accepts_in(&item.value, hierarchy)
    })
}

fn shape_accepts_shape(
    target: &KeyedArrayType,
    source: &KeyedArrayType,
    hierarchy: &dyn ClassHierarchy,
) -> bool {
    if target.is_list() && !source.is_list() {
        return false;
    }
    target.items().iter().all(|expected| match source.get(&expected.key) {
        Some(actual) => {
            (expected.optional || !actual.optional)
                && expected.value.accepts_in(&actual.value, hierarchy)
        }
        None => expected.optional,
    })
}

fn generic_accepts(target: &Generic, source: &Generic, hierarchy: &dyn ClassHierarchy) -> bool {
    hierarchy.is_subclass_of(&source.name, &target.name)
        && target.args.len() == source.args.len()
        && target
            .args
            .iter()
            .zip(&source.args)
            .all(|(expected, actual)| expected.accepts_in(actual, hierarchy))
}

fn function_accepts(
    target: &FunctionType,
    source: &FunctionType,
    hierarchy: &dyn ClassHierarchy,
) -> bool {
    let required = source.params.iter().filter(|p| p.is_required()).count();
    if required > target.params.len() {
        return false;
    }
    let params_ok = target
        .params
        .iter()
        .zip(&source.params)
        .all(|(expected, actual)| actual.ty.accepts_in(&expected.ty, hierarchy));
    params_ok && target.return_type.accepts_in(&source.return_type, hierarchy)
}

fn same_sequence(a: &[Type], b: &[Type]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.is_same(y))
}

/// Every element of `a` is matched by a distinct structurally equal
/// element of `b`, and vice versa.
fn same_multiset(a: &[Type], b: &[Type]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        let slot = b
            .iter()
            .enumerate()
            .position(|(i, y)| !used[i] && x.is_same(y));
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

#[cfg(test)]
#[path = "../tests/relation_tests.rs"]
mod tests;
