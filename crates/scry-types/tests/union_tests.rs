use super::*;
use crate::types::Type;

#[test]
fn test_wrap_empty_is_void() {
    assert_eq!(Union::wrap(Vec::new()), Type::Void);
}

#[test]
fn test_wrap_single_is_unwrapped() {
    assert_eq!(Union::wrap([Type::Integer]), Type::Integer);
    assert_eq!(Union::wrap([Type::Integer, Type::Integer]), Type::Integer);
}

#[test]
fn test_wrap_dedups_preserving_first_seen_order() {
    let ty = Union::wrap([
        Type::String,
        Type::int_literal(1),
        Type::String,
        Type::Null,
        Type::int_literal(1),
    ]);
    assert_eq!(ty.to_string(), "string|int(1)|null");
    assert_eq!(ty.members().len(), 3);
}

#[test]
fn test_wrap_flattens_nested_unions() {
    let inner = Union::wrap([Type::Integer, Type::String]);
    let ty = Union::wrap([Type::Null, inner, Type::Integer]);
    let Type::Union(union) = &ty else {
        panic!("expected a union, got {ty}");
    };
    assert_eq!(union.len(), 3);
    assert!(union.iter().all(|member| !member.is_union()));
    assert_eq!(ty.to_string(), "null|int|string");
}

#[test]
fn test_wrap_distinguishes_literals_from_bases() {
    let ty = Union::wrap([Type::int_literal(1), Type::Integer, Type::int_literal(2)]);
    assert_eq!(ty.members().len(), 3);
}

#[test]
fn test_union_members_are_pairwise_distinct() {
    let ty = Union::wrap([
        Type::array_of(Type::Integer),
        Type::array_of(Type::Integer),
        Type::list_of(Type::Integer),
        Type::object("App\\User"),
        Type::object("\\App\\User"),
    ]);
    let members = ty.members();
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            assert!(!a.is_same(b), "{a} and {b} should not both be members");
        }
    }
    assert_eq!(members.len(), 3);
}
