use super::*;
use scry_ast::ImportTable;

use crate::index::DefinitionIndex;
use crate::scope::NameResolver;

/// Decides calls to one function name.
struct CallHook {
    function: &'static str,
    ty: Type,
}

impl ExpressionTypeHook for CallHook {
    fn infer(&self, expr: &Expr, _scope: &Scope<'_>) -> Option<Type> {
        match expr {
            Expr::FuncCall { name, .. } if name == self.function => Some(self.ty.clone()),
            _ => None,
        }
    }
}

struct Throws(&'static str);

impl DefinitionHook for Throws {
    fn exceptions(&self, _unit: &UnitId, _definition: &FunctionLikeDefinition) -> Vec<Type> {
        vec![Type::object(self.0)]
    }
}

fn with_scope(f: impl FnOnce(&Scope<'_>)) {
    let imports = ImportTable::default();
    let index = DefinitionIndex::new();
    let scope = Scope::new(NameResolver::new(&imports), &index);
    f(&scope);
}

#[test]
fn test_first_definitive_hook_wins() {
    let mut broker = ExtensionBroker::new();
    broker.register(Extension::expression(CallHook {
        function: "route",
        ty: Type::string_literal("first"),
    }));
    broker.register(Extension::expression(CallHook {
        function: "route",
        ty: Type::string_literal("second"),
    }));
    assert_eq!(broker.len(), 2);

    with_scope(|scope| {
        let call = Expr::call("route", vec![]);
        assert_eq!(
            broker.infer_expression(&call, scope),
            Some(Type::string_literal("first"))
        );
        assert_eq!(broker.infer_expression(&Expr::call("url", vec![]), scope), None);
    });
}

#[test]
fn test_deferring_hooks_fall_through() {
    let mut broker = ExtensionBroker::new();
    broker.register(Extension::expression(CallHook {
        function: "config",
        ty: Type::Mixed,
    }));
    broker.register(Extension::definition(Throws("LogicException")));
    broker.register(Extension::expression(CallHook {
        function: "route",
        ty: Type::String,
    }));
    with_scope(|scope| {
        assert_eq!(
            broker.infer_expression(&Expr::call("route", vec![]), scope),
            Some(Type::String)
        );
    });
}

#[test]
fn test_definition_hooks_only_add_exceptions() {
    let mut broker = ExtensionBroker::new();
    broker.register(Extension::definition(Throws("AuthorizationException")));
    broker.register(Extension::definition(Throws("ValidationException")));
    broker.register(Extension::definition(Throws("AuthorizationException")));

    let unit = UnitId::method("App\\Http\\UserController", "store");
    let mut definition = FunctionLikeDefinition::new("store", unit.clone());
    definition.add_exception(Type::object("ModelNotFoundException"));
    broker.extend_definition(&unit, &mut definition);

    let exceptions: Vec<String> = definition.exceptions().iter().map(ToString::to_string).collect();
    assert_eq!(
        exceptions,
        ["ModelNotFoundException", "AuthorizationException", "ValidationException"]
    );
}

#[test]
fn test_empty_broker_defers() {
    let broker = ExtensionBroker::new();
    assert!(broker.is_empty());
    with_scope(|scope| {
        assert_eq!(broker.infer_expression(&Expr::Int(1), scope), None);
    });
}
