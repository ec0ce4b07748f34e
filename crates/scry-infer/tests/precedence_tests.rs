use super::*;
use scry_types::{NoHierarchy, parse_type};

struct Models;

impl ClassHierarchy for Models {
    fn is_subclass_of(&self, child: &str, ancestor: &str) -> bool {
        child == ancestor || (child == "Admin" && ancestor == "User")
    }
}

fn ty(src: &str) -> Type {
    parse_type(src).expect("valid type")
}

#[test]
fn test_override_always_wins() {
    let selection = select_return(
        ReturnSignals {
            override_return: Some(ty("array{id: int}")),
            declared: Some(ty("string")),
            inferred: Some(ty("int(1)")),
        },
        &NoHierarchy,
    );
    assert_eq!(selection.source, ReturnSource::Override);
    assert_eq!(selection.ty.to_string(), "array{id: int}");
}

#[test]
fn test_declared_wins_on_mismatch() {
    let selection = select_return(
        ReturnSignals {
            override_return: None,
            declared: Some(ty("string")),
            inferred: Some(ty("int(1)|int(2)")),
        },
        &NoHierarchy,
    );
    assert_eq!(selection.source, ReturnSource::Declared);
    assert_eq!(selection.ty, Type::String);
}

#[test]
fn test_inferred_wins_when_it_fits() {
    let selection = select_return(
        ReturnSignals {
            override_return: None,
            declared: Some(ty("int|string")),
            inferred: Some(ty("int(1)|string(a)")),
        },
        &NoHierarchy,
    );
    assert_eq!(selection.source, ReturnSource::Inferred);
    assert_eq!(selection.ty.to_string(), "int(1)|string(a)");
}

#[test]
fn test_unknown_inferred_keeps_declared() {
    let selection = select_return(
        ReturnSignals {
            override_return: None,
            declared: Some(ty("User")),
            inferred: Some(Type::Unknown),
        },
        &NoHierarchy,
    );
    assert_eq!(selection.source, ReturnSource::Declared);
}

#[test]
fn test_subclass_fits_through_hierarchy() {
    let signals = ReturnSignals {
        override_return: None,
        declared: Some(ty("User")),
        inferred: Some(ty("Admin")),
    };
    assert_eq!(
        select_return(signals.clone(), &Models).source,
        ReturnSource::Inferred
    );
    assert_eq!(select_return(signals, &NoHierarchy).source, ReturnSource::Declared);
}

#[test]
fn test_single_signals() {
    let declared_only = select_return(
        ReturnSignals {
            declared: Some(Type::Void),
            ..ReturnSignals::default()
        },
        &NoHierarchy,
    );
    assert_eq!(declared_only.ty, Type::Void);
    assert_eq!(declared_only.source, ReturnSource::Declared);

    let inferred_only = select_return(
        ReturnSignals {
            inferred: Some(Type::Null),
            ..ReturnSignals::default()
        },
        &NoHierarchy,
    );
    assert_eq!(inferred_only.source, ReturnSource::Inferred);

    let nothing = select_return(ReturnSignals::default(), &NoHierarchy);
    assert_eq!(nothing.ty, Type::Unknown);
    assert_eq!(nothing.source, ReturnSource::Missing);
}
