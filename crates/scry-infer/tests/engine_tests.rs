use super::*;
use scry_ast::{
    ClassDecl, ClassKind, ClassRef, FunctionDecl, ImportTable, MemberFlags, Param, PropertyDecl,
    SourceFile, Stmt, TypeHint,
};

use crate::broker::{DefinitionHook, Extension, ExpressionTypeHook};
use crate::index::Maturity;
use crate::test_support::{global_functions, init_tracing, return_of};

fn ctx() -> Context {
    Context::new(InferConfig::default())
}

fn returning(name: &str, value: Expr) -> FunctionDecl {
    FunctionDecl::new(name).with_body(vec![Stmt::ret(value)])
}

fn calling(name: &str, callee: &str) -> FunctionDecl {
    returning(name, Expr::call(callee, Vec::new()))
}

fn must(result: Result<FunctionLikeDefinition, InferError>) -> FunctionLikeDefinition {
    result.unwrap_or_else(|err| panic!("{err}"))
}

// =============================================================================
// Recursion
// =============================================================================

fn factorial(hint: Option<&str>) -> FunctionDecl {
    let decl = FunctionDecl::new("fact")
        .with_params(vec![Param::new("n")])
        .with_body(vec![
            Stmt::If {
                condition: Expr::var("n"),
                then: vec![Stmt::ret(Expr::Int(1))],
                else_ifs: Vec::new(),
                otherwise: None,
            },
            Stmt::ret(Expr::call("fact", vec![Expr::var("n")])),
        ]);
    match hint {
        Some(hint) => decl.with_return_hint(TypeHint::named(hint)),
        None => decl,
    }
}

#[test]
fn test_direct_recursion_sees_the_signature() {
    let source = global_functions(vec![factorial(None)]);
    assert_eq!(return_of(&source, &ctx(), "fact"), "int|unknown");

    let hinted = global_functions(vec![factorial(Some("int"))]);
    assert_eq!(return_of(&hinted, &ctx(), "fact"), "int");
}

#[test]
fn test_mutual_recursion_terminates() {
    init_tracing();
    let source = global_functions(vec![calling("ping", "pong"), calling("pong", "ping")]);
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    let report = engine.analyze(&[UnitId::function("ping"), UnitId::function("pong")]);
    assert!(report.is_clean());
    for unit in ["ping", "pong"] {
        let unit = UnitId::function(unit);
        assert_eq!(ctx.index().maturity(&unit), Some(Maturity::Full));
        let definition = report.definition(&unit).expect("definition");
        assert_eq!(definition.return_type, Type::Unknown);
    }
}

#[test]
fn test_depth_limit_serves_the_signature() {
    init_tracing();
    let source = global_functions(vec![
        calling("a", "b"),
        calling("b", "c"),
        returning("c", Expr::Int(1)),
    ]);
    let ctx = Context::new(InferConfig::default().with_max_call_depth(2));
    let engine = Engine::new(&source, &ctx);

    let report = engine.analyze(&[UnitId::function("a"), UnitId::function("c")]);
    let a = report.definition(&UnitId::function("a")).expect("a");
    assert_eq!(a.return_type, Type::Unknown);
    let c = report.definition(&UnitId::function("c")).expect("c");
    assert_eq!(c.return_type, Type::int_literal(1));
}

#[test]
fn test_calls_use_callee_definitions() {
    let source = global_functions(vec![
        calling("outer", "inner"),
        returning("inner", Expr::string("done")),
    ]);
    assert_eq!(return_of(&source, &ctx(), "outer"), "string(done)");
}

#[test]
fn test_definitions_are_memoized() {
    init_tracing();
    let source = global_functions(vec![returning("one", Expr::Int(1))]);
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    let first = must(engine.function_definition("one"));
    assert_eq!(ctx.index().len(), 1);
    let second = must(engine.function_definition("ONE"));
    assert_eq!(first, second);
    assert_eq!(ctx.index().len(), 1);

    ctx.reset();
    assert!(ctx.index().is_empty());
}

// =============================================================================
// Precedence
// =============================================================================

#[test]
fn test_declared_type_wins_on_mismatch() {
    let mismatch = returning("label", Expr::Int(1)).with_return_hint(TypeHint::named("string"));
    let narrower = returning("code", Expr::Int(1)).with_return_hint(TypeHint::named("int"));
    let source = global_functions(vec![mismatch, narrower]);
    let ctx = ctx();
    assert_eq!(return_of(&source, &ctx, "label"), "string");
    assert_eq!(return_of(&source, &ctx, "code"), "int(1)");
}

#[test]
fn test_override_tag_always_wins() {
    init_tracing();
    let decl = returning("total", Expr::Int(1))
        .with_return_hint(TypeHint::named("int"))
        .with_doc("/** @scry-return float */");
    let broken = returning("count", Expr::Int(1)).with_doc("/** @scry-return list<int */");
    let source = global_functions(vec![decl, broken]);
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    let report = engine.analyze(&[UnitId::function("total"), UnitId::function("count")]);
    let total = report.definition(&UnitId::function("total")).expect("total");
    assert_eq!(total.return_type, Type::Float);

    let count_unit = UnitId::function("count");
    let count = report.definition(&count_unit).expect("count");
    assert_eq!(count.return_type, Type::int_literal(1));
    let failures: Vec<&InferError> = report.failures_for(&count_unit).collect();
    assert!(matches!(
        failures.as_slice(),
        [InferError::IncompatibleOverride { tag, .. }] if tag == "scry-return"
    ));
}

#[test]
fn test_custom_override_tag() {
    let decl = returning("total", Expr::Int(1)).with_doc("/** @phpstan-return positive-int */");
    let source = global_functions(vec![decl]);
    let ctx = Context::new(InferConfig::default().with_override_tag("@phpstan-return"));
    assert_eq!(return_of(&source, &ctx, "total"), "int");
}

// =============================================================================
// Exceptions
// =============================================================================

fn thrower() -> FunctionDecl {
    FunctionDecl::new("fail").with_body(vec![Stmt::throw(Expr::new_object(
        "RuntimeException",
        Vec::new(),
    ))])
}

#[test]
fn test_exceptions_propagate_from_calls() {
    init_tracing();
    let source = global_functions(vec![thrower(), calling("caller", "fail")]);

    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);
    let caller = must(engine.function_definition("caller"));
    assert_eq!(caller.exceptions(), [Type::object("RuntimeException")]);

    let mut config = InferConfig::default();
    config.infer_thrown_from_calls = false;
    let ctx = Context::new(config);
    let engine = Engine::new(&source, &ctx);
    assert!(must(engine.function_definition("caller")).exceptions().is_empty());
}

#[test]
fn test_builtin_exceptions_propagate() {
    init_tracing();
    let decl = returning(
        "half",
        Expr::call("intdiv", vec![Expr::var("n"), Expr::Int(2)]),
    )
    .with_params(vec![Param::new("n")]);
    let source = global_functions(vec![decl]);
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    let half = must(engine.function_definition("half"));
    assert_eq!(half.return_type, Type::Integer);
    let exceptions: Vec<String> = half.exceptions().iter().map(ToString::to_string).collect();
    assert_eq!(exceptions, ["DivisionByZeroError", "ArithmeticError"]);
}

struct AlwaysTimesOut;

impl DefinitionHook for AlwaysTimesOut {
    fn exceptions(&self, unit: &UnitId, _definition: &FunctionLikeDefinition) -> Vec<Type> {
        if unit.member_name() == "fetch" {
            vec![Type::object("App\\TimeoutException")]
        } else {
            Vec::new()
        }
    }
}

#[test]
fn test_definition_hook_adds_exceptions() {
    init_tracing();
    let source = global_functions(vec![returning("fetch", Expr::Null), returning("other", Expr::Null)]);
    let ctx = ctx().with_extension(Extension::definition(AlwaysTimesOut));
    let engine = Engine::new(&source, &ctx);

    let fetch = must(engine.function_definition("fetch"));
    assert_eq!(fetch.exceptions(), [Type::object("App\\TimeoutException")]);
    assert!(must(engine.function_definition("other")).exceptions().is_empty());
}

// =============================================================================
// Expression hooks and failure isolation
// =============================================================================

/// Types `config('app.name')` calls.
struct ConfigValues;

impl ExpressionTypeHook for ConfigValues {
    fn infer(&self, expr: &Expr, _scope: &Scope<'_>) -> Option<Type> {
        match expr {
            Expr::FuncCall { name, .. } if name == "config" => Some(Type::string_literal("scry")),
            _ => None,
        }
    }
}

struct Explodes;

impl ExpressionTypeHook for Explodes {
    fn infer(&self, expr: &Expr, _scope: &Scope<'_>) -> Option<Type> {
        match expr {
            Expr::FuncCall { name, .. } if name == "boom" => panic!("hook exploded"),
            _ => None,
        }
    }
}

#[test]
fn test_expression_hook_decides() {
    let app_name = returning("app_name", Expr::call("config", vec![Expr::string("app.name")]));
    let source = global_functions(vec![app_name]);

    assert_eq!(return_of(&source, &ctx(), "app_name"), "unknown");
    let hooked = ctx().with_extension(Extension::expression(ConfigValues));
    assert_eq!(return_of(&source, &hooked, "app_name"), "string(scry)");
}

#[test]
fn test_panicking_unit_is_isolated() {
    init_tracing();
    let source = global_functions(vec![calling("broken", "boom"), returning("fine", Expr::Int(1))]);
    let ctx = ctx().with_extension(Extension::expression(Explodes));
    let engine = Engine::new(&source, &ctx);

    let broken = UnitId::function("broken");
    let fine = UnitId::function("fine");
    let report = engine.analyze(&[broken.clone(), fine.clone()]);

    assert!(report.definition(&broken).is_none());
    assert!(report.definition(&fine).is_some());
    assert!(matches!(
        report.failures.as_slice(),
        [InferError::UnitFailure { unit, reason }] if *unit == broken && reason == "hook exploded"
    ));
}

#[test]
fn test_failing_callee_does_not_fail_its_caller() {
    init_tracing();
    let source = global_functions(vec![calling("caller", "broken"), calling("broken", "boom")]);
    let ctx = ctx().with_extension(Extension::expression(Explodes));
    let engine = Engine::new(&source, &ctx);

    let caller = UnitId::function("caller");
    let broken = UnitId::function("broken");
    let report = engine.analyze(&[caller.clone(), broken.clone()]);

    let built = report.definition(&caller).expect("caller is built");
    assert_eq!(built.return_type, Type::Unknown);
    assert!(report.definition(&broken).is_none());
    assert!(matches!(
        report.failures.as_slice(),
        [InferError::UnitFailure { unit, reason }] if *unit == broken && reason == "hook exploded"
    ));
    assert_eq!(report.failures_for(&caller).count(), 0);

    assert_eq!(ctx.index().maturity(&caller), Some(Maturity::Full));
    assert_eq!(ctx.index().maturity(&broken), Some(Maturity::Full));
    assert_eq!(ctx.index().failure(&broken).as_deref(), Some("hook exploded"));

    // A later run reports the memoized failure without re-running the hook.
    let again = engine.analyze(&[broken.clone()]);
    assert!(again.definition(&broken).is_none());
    assert!(matches!(
        again.failures.as_slice(),
        [InferError::UnitFailure { unit, .. }] if *unit == broken
    ));
}

#[test]
fn test_missing_unit_is_reported() {
    init_tracing();
    let source = global_functions(vec![calling("caller", "nowhere")]);
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    let report = engine.analyze(&[UnitId::function("caller"), UnitId::function("nope")]);
    let caller = report.definition(&UnitId::function("caller")).expect("caller");
    assert_eq!(caller.return_type, Type::Unknown);
    assert!(matches!(
        report.failures.as_slice(),
        [InferError::NotFound { unit }] if *unit == UnitId::function("nope")
    ));
}

// =============================================================================
// Classes
// =============================================================================

fn models() -> SourceIndex {
    let imports = ImportTable::new(Some("App\\Models"));
    let timestamps = ClassDecl::new("App\\Models\\HasTimestamps")
        .with_kind(ClassKind::Trait)
        .with_method(
        FunctionDecl::new("touchedAt").with_return_hint(TypeHint::named("\\DateTimeImmutable")),
    );
    let model = ClassDecl::new("App\\Models\\Model")
        .with_traits(vec!["HasTimestamps".to_string()])
        .with_property(PropertyDecl::new("id").with_hint(TypeHint::named("int")))
        .with_property(PropertyDecl::new("table").with_default(Expr::string("models")))
        .with_method(returning("getKey", Expr::property(Expr::this(), "id")))
        .with_method(returning("fresh", Expr::static_call(ClassRef::Static, "query", Vec::new())))
        .with_method(
            FunctionDecl::new("query")
                .with_flags(MemberFlags::STATIC)
                .with_body(vec![Stmt::ret(Expr::New {
                    class: ClassRef::Static,
                    args: Vec::new(),
                })]),
        );
    let user = ClassDecl::new("App\\Models\\User")
        .with_parent("Model")
        .with_property(
            PropertyDecl::new("email").with_doc("/** @var non-empty-string */"),
        );
    let file = SourceFile::new("Models.php", imports)
        .with_class(timestamps)
        .with_class(model)
        .with_class(user);
    SourceIndex::new().with_file(file)
}

#[test]
fn test_inherited_methods_are_built_once() {
    init_tracing();
    let source = models();
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    let inherited = must(engine.method_definition("App\\Models\\User", "getKey"));
    assert_eq!(inherited.return_type, Type::Integer);
    assert_eq!(
        inherited.defining_unit,
        UnitId::method("App\\Models\\Model", "getKey")
    );
    assert!(ctx.index().contains(&UnitId::method("App\\Models\\Model", "getKey")));
    assert!(!ctx.index().contains(&UnitId::method("App\\Models\\User", "getKey")));

    let from_trait = must(engine.method_definition("App\\Models\\User", "touchedAt"));
    assert_eq!(from_trait.return_type, Type::object("DateTimeImmutable"));
}

#[test]
fn test_static_returns_follow_the_receiver() {
    init_tracing();
    let source = models();
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);
    let imports = ImportTable::new(Some("App\\Models"));
    let mut scope = Scope::new(crate::scope::NameResolver::new(&imports), ctx.index());

    let query = Expr::static_call(ClassRef::Named("User".to_string()), "query", Vec::new());
    assert_eq!(
        engine.infer_expression(&query, &mut scope),
        Type::object("App\\Models\\User")
    );
    let fresh = Expr::method_call(Expr::new_object("User", Vec::new()), "fresh", Vec::new());
    assert_eq!(
        engine.infer_expression(&fresh, &mut scope),
        Type::object("App\\Models\\User")
    );
}

#[test]
fn test_property_types() {
    init_tracing();
    let source = models();
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    assert_eq!(engine.property_type("App\\Models\\User", "id"), Some(Type::Integer));
    assert_eq!(engine.property_type("App\\Models\\User", "table"), Some(Type::String));
    assert_eq!(engine.property_type("App\\Models\\User", "email"), Some(Type::String));
    assert_eq!(engine.property_type("App\\Models\\User", "missing"), None);
}

#[test]
fn test_class_definition_lists_visible_members() {
    init_tracing();
    let source = models();
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    let class = engine.class_definition("App\\Models\\User").expect("class");
    assert_eq!(class.parent.as_deref(), Some("App\\Models\\Model"));
    let properties: Vec<&str> = class.properties.keys().map(String::as_str).collect();
    assert_eq!(properties, ["email", "id", "table"]);
    assert!(class.method("GETKEY").is_some());
    assert!(class.method("touchedAt").is_some());
    assert_eq!(class.self_type(), Type::object("App\\Models\\User"));
    assert!(engine.take_failures().is_empty());

    assert!(engine.class_definition("App\\Models\\Missing").is_none());
}

#[test]
fn test_analyze_all_covers_functions_and_methods() {
    init_tracing();
    let source = models().with_file(
        SourceFile::new("helpers.php", ImportTable::default()).with_function(returning("helper", Expr::Null)),
    );
    let ctx = ctx();
    let engine = Engine::new(&source, &ctx);

    let report = engine.analyze_all();
    assert!(report.is_clean(), "{:?}", report.failures);
    assert!(report.definition(&UnitId::function("helper")).is_some());
    assert!(
        report
            .definition(&UnitId::method("App\\Models\\Model", "fresh"))
            .is_some()
    );
    assert_eq!(report.definitions.len(), 5);
}
