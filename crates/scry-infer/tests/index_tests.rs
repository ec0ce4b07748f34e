use super::*;
use scry_types::{Type, Union};

fn definition(name: &str, return_type: Type) -> FunctionLikeDefinition {
    FunctionLikeDefinition::new(name, UnitId::function(name)).with_return_type(return_type)
}

#[test]
fn test_shallow_then_full() {
    let index = DefinitionIndex::new();
    let unit = UnitId::function("App\\load");
    assert!(index.get(&unit).is_none());

    index.insert_shallow(&unit, definition("App\\load", Type::Unknown));
    assert_eq!(index.maturity(&unit), Some(Maturity::Shallow));

    index.complete(&unit, definition("App\\load", Type::Integer));
    let entry = index.get(&unit).expect("entry exists");
    assert_eq!(entry.maturity, Maturity::Full);
    assert_eq!(entry.definition.return_type, Type::Integer);
    assert_eq!(index.len(), 1);
}

#[test]
fn test_shallow_never_downgrades_an_entry() {
    let index = DefinitionIndex::new();
    let unit = UnitId::function("f");
    index.complete(&unit, definition("f", Type::String));
    index.insert_shallow(&unit, definition("f", Type::Unknown));
    let entry = index.get(&unit).expect("entry exists");
    assert_eq!(entry.maturity, Maturity::Full);
    assert_eq!(entry.definition.return_type, Type::String);
}

#[test]
fn test_failed_entry_keeps_the_signature() {
    let index = DefinitionIndex::new();
    let unit = UnitId::function("broken");
    index.insert_shallow(&unit, definition("broken", Type::Unknown));
    assert_eq!(index.failure(&unit), None);

    index.fail(&unit, definition("broken", Type::Unknown), "hook exploded".to_string());
    let entry = index.get(&unit).expect("entry exists");
    assert_eq!(entry.maturity, Maturity::Full);
    assert!(entry.is_failed());
    assert_eq!(index.failure(&UnitId::function("BROKEN")).as_deref(), Some("hook exploded"));

    index.complete(&unit, definition("broken", Type::Integer));
    assert!(!index.get(&unit).expect("entry exists").is_failed());
}

#[test]
fn test_lookup_ignores_case() {
    let index = DefinitionIndex::new();
    index.complete(
        &UnitId::method("App\\User", "getName"),
        definition("getName", Type::String),
    );
    assert!(index.contains(&UnitId::method("\\app\\user", "GETNAME")));
}

#[test]
fn test_reset_clears_everything() {
    let index = DefinitionIndex::new();
    index.complete(&UnitId::function("a"), definition("a", Type::Null));
    index.insert_shallow(&UnitId::function("b"), definition("b", Type::Null));
    assert_eq!(index.len(), 2);
    index.reset();
    assert!(index.is_empty());
}

#[test]
fn test_exceptions_only_grow() {
    let mut def = definition("f", Type::Void);
    def.add_exception(Type::object("RuntimeException"));
    def.add_exception(Type::object("RuntimeException"));
    def.add_exception(Union::wrap([
        Type::object("LogicException"),
        Type::object("RuntimeException"),
    ]));
    let rendered: Vec<String> = def.exceptions().iter().map(ToString::to_string).collect();
    assert_eq!(rendered, ["RuntimeException", "LogicException"]);
}
