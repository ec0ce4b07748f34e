use super::*;
use scry_ast::{
    ClassDecl, FunctionDecl, ImportTable, PropertyDecl, SourceFile, SourceIndex, Stmt, TypeHint,
};
use scry_types::KeyedItem;

use crate::config::InferConfig;
use crate::context::Context;
use crate::engine::Engine;
use crate::scope::NameResolver;
use crate::test_support::init_tracing;

// =============================================================================
// Type rules
// =============================================================================

#[test]
fn test_arithmetic_folds_literals() {
    let two = Type::int_literal(2);
    let three = Type::int_literal(3);
    assert_eq!(binary_type(BinaryOp::Add, &two, &three), Type::int_literal(5));
    assert_eq!(binary_type(BinaryOp::Sub, &two, &three), Type::int_literal(-1));
    assert_eq!(binary_type(BinaryOp::Mul, &two, &three), Type::int_literal(6));

    let max = Type::int_literal(i64::MAX);
    assert_eq!(binary_type(BinaryOp::Add, &max, &Type::int_literal(1)), Type::Float);
}

#[test]
fn test_arithmetic_on_base_types() {
    assert_eq!(binary_type(BinaryOp::Add, &Type::Integer, &Type::int_literal(1)), Type::Integer);
    assert_eq!(binary_type(BinaryOp::Mul, &Type::Float, &Type::Integer), Type::Float);
    assert_eq!(
        binary_type(BinaryOp::Add, &Type::String, &Type::Integer).to_string(),
        "int|float"
    );
    assert_eq!(
        binary_type(BinaryOp::Div, &Type::Integer, &Type::Integer).to_string(),
        "int|float"
    );
    assert_eq!(binary_type(BinaryOp::Div, &Type::Integer, &Type::Float), Type::Float);
    assert_eq!(binary_type(BinaryOp::Mod, &Type::Float, &Type::Float), Type::Integer);
    assert_eq!(binary_type(BinaryOp::ShiftLeft, &Type::Integer, &Type::Integer), Type::Integer);
    assert_eq!(binary_type(BinaryOp::Identical, &Type::Integer, &Type::String), Type::Boolean);
}

#[test]
fn test_concat() {
    assert_eq!(
        binary_type(BinaryOp::Concat, &Type::string_literal("id-"), &Type::int_literal(7)),
        Type::string_literal("id-7")
    );
    assert_eq!(
        binary_type(BinaryOp::Concat, &Type::string_literal("a"), &Type::String),
        Type::String
    );
}

#[test]
fn test_coalesce() {
    let fallback = Type::int_literal(1);
    assert_eq!(binary_type(BinaryOp::Coalesce, &Type::Null, &fallback), fallback);
    assert_eq!(binary_type(BinaryOp::Coalesce, &Type::Unknown, &fallback), Type::Unknown);
    assert_eq!(
        binary_type(BinaryOp::Coalesce, &Type::nullable(Type::String), &fallback).to_string(),
        "string|int(1)"
    );
}

#[test]
fn test_array_union_keeps_left_keys() {
    let left = Type::KeyedArray(KeyedArrayType::new(vec![KeyedItem::new(
        ArrayKey::from_string("a"),
        Type::int_literal(1),
    )]));
    let right = Type::KeyedArray(KeyedArrayType::new(vec![
        KeyedItem::new(ArrayKey::from_string("a"), Type::string_literal("x")),
        KeyedItem::new(ArrayKey::from_string("b"), Type::Boolean),
    ]));
    assert_eq!(
        binary_type(BinaryOp::Add, &left, &right).to_string(),
        "array{a: int(1), b: boolean}"
    );
}

#[test]
fn test_unary() {
    assert_eq!(unary_type(UnaryOp::Minus, &Type::int_literal(3)), Type::int_literal(-3));
    assert_eq!(unary_type(UnaryOp::Minus, &Type::int_literal(i64::MIN)), Type::Float);
    assert_eq!(unary_type(UnaryOp::Not, &Type::String), Type::Boolean);
    assert_eq!(unary_type(UnaryOp::Plus, &Type::String).to_string(), "int|float");
}

#[test]
fn test_casts() {
    assert_eq!(cast_type(CastKind::Int, &Type::bool_literal(true)), Type::int_literal(1));
    assert_eq!(cast_type(CastKind::Int, &Type::String), Type::Integer);
    assert_eq!(cast_type(CastKind::String, &Type::int_literal(5)), Type::string_literal("5"));
    assert_eq!(cast_type(CastKind::Array, &Type::Null).to_string(), "list{}");
    assert_eq!(cast_type(CastKind::Array, &Type::String).to_string(), "array<mixed>");
    assert_eq!(cast_type(CastKind::Object, &Type::Integer), Type::object("stdClass"));
}

#[test]
fn test_element_type() {
    let shape = Type::KeyedArray(KeyedArrayType::new(vec![KeyedItem::new(
        ArrayKey::from_string("id"),
        Type::Integer,
    )]));
    assert_eq!(element_type(&shape, &Type::string_literal("id")), Type::Integer);
    assert_eq!(element_type(&shape, &Type::string_literal("missing")), Type::Null);
    assert_eq!(element_type(&shape, &Type::String), Type::Integer);

    assert_eq!(element_type(&Type::list_of(Type::String), &Type::Integer), Type::String);
    assert_eq!(element_type(&Type::String, &Type::int_literal(0)), Type::String);
    assert_eq!(
        element_type(&Type::nullable(Type::list_of(Type::Float)), &Type::Integer),
        Type::Float
    );
    assert_eq!(element_type(&Type::Integer, &Type::Integer), Type::Unknown);
}

#[test]
fn test_with_element() {
    let pushed = with_element(None, None, Type::int_literal(1));
    assert_eq!(pushed.to_string(), "list{int(1)}");
    let keyed = with_element(Some(pushed), Some(Type::string_literal("k")), Type::string_literal("v"));
    assert_eq!(keyed.to_string(), "array{0: int(1), k: string(v)}");
    let degraded = with_element(Some(keyed), Some(Type::String), Type::Boolean);
    assert_eq!(degraded.to_string(), "array<int(1)|string(v)|boolean>");

    let list = Some(Type::list_of(Type::Integer));
    assert_eq!(
        with_element(list.clone(), None, Type::String).to_string(),
        "list<int|string>"
    );
    assert_eq!(
        with_element(list, Some(Type::string_literal("k")), Type::Integer).to_string(),
        "array<int>"
    );
}

#[test]
fn test_unify_binds_first_occurrence() {
    let mut subst = TemplateSubstitution::new();
    let param = Type::array_of(Type::template("T"));
    let arg = Type::KeyedArray(KeyedArrayType::list(vec![Type::int_literal(1)]));
    unify(&param, &arg, &mut subst);
    assert_eq!(subst.get("T"), Some(&Type::Integer));

    unify(&Type::template("T"), &Type::String, &mut subst);
    assert_eq!(subst.get("T"), Some(&Type::Integer));

    unify(&Type::nullable(Type::template("U")), &Type::Unknown, &mut subst);
    assert_eq!(subst.get("U"), None);
    unify(&Type::nullable(Type::template("U")), &Type::nullable(Type::String), &mut subst);
    assert_eq!(subst.get("U"), Some(&Type::String));
}

// =============================================================================
// Expressions
// =============================================================================

fn classes() -> SourceIndex {
    let boxed = ClassDecl::new("Box")
        .with_doc("/** @template T */")
        .with_property(PropertyDecl::new("value").with_doc("/** @var T */"))
        .with_method(
            FunctionDecl::new("__construct")
                .with_params(vec![Param::new("value")])
                .with_doc("/** @param T $value */")
                .with_body(Vec::new()),
        )
        .with_method(FunctionDecl::new("get").with_doc("/** @return T */"))
        .with_method(FunctionDecl::new("strings").with_doc("/** @return Box<string> */"));
    let builder = ClassDecl::new("Builder")
        .with_method(
            FunctionDecl::new("named")
                .with_params(vec![Param::new("name")])
                .with_body(vec![Stmt::ret(Expr::this())]),
        )
        .with_method(FunctionDecl::new("copy").with_doc("/** @return static */"))
        .with_method(
            FunctionDecl::new("maybe")
                .with_return_hint(TypeHint::nullable(TypeHint::named("static"))),
        );
    let child = ClassDecl::new("ChildBuilder").with_parent("Builder");
    let node = ClassDecl::new("Node").with_method(
        FunctionDecl::new("make")
            .with_return_hint(TypeHint::named("Node"))
            .with_body(vec![Stmt::ret(Expr::new_object("Node", Vec::new()))]),
    );
    let sub_node = ClassDecl::new("SubNode").with_parent("Node");
    let file = SourceFile::new("classes.php", ImportTable::default())
        .with_class(boxed)
        .with_class(builder)
        .with_class(child)
        .with_class(node)
        .with_class(sub_node);
    SourceIndex::new().with_file(file)
}

/// Evaluates `exprs` in order in one scope; renders the last type.
fn eval(source: &SourceIndex, bindings: &[(&str, Type)], exprs: &[Expr]) -> String {
    init_tracing();
    let ctx = Context::new(InferConfig::default());
    let engine = Engine::new(source, &ctx);
    let imports = ImportTable::default();
    let mut scope = Scope::new(NameResolver::new(&imports), ctx.index());
    for (name, ty) in bindings {
        scope.bind(*name, ty.clone());
    }
    let mut last = Type::Void;
    for expr in exprs {
        last = engine.infer_expression(expr, &mut scope);
    }
    last.to_string()
}

fn assign(name: &str, value: Expr) -> Expr {
    Expr::assign(Expr::var(name), value)
}

#[test]
fn test_array_literals() {
    let source = SourceIndex::new();
    let keyed = Expr::Array(vec![
        ArrayItem::keyed(Expr::string("foo"), Expr::Int(1)),
        ArrayItem::keyed(Expr::string("bar"), Expr::string("foo")),
        ArrayItem::positional(Expr::Int(23)),
    ]);
    assert_eq!(
        eval(&source, &[], &[keyed]),
        "array{foo: int(1), bar: string(foo), 0: int(23)}"
    );

    let list = Expr::list(vec![Expr::Int(1), Expr::Int(2), Expr::string("foo")]);
    assert_eq!(eval(&source, &[], &[list]), "list{int(1), int(2), string(foo)}");
}

#[test]
fn test_spread_renumbers_int_keys() {
    let first = assign(
        "a",
        Expr::Array(vec![
            ArrayItem::positional(Expr::Int(42)),
            ArrayItem::keyed(Expr::string("b"), Expr::string("wow")),
        ]),
    );
    let spread = Expr::Array(vec![
        ArrayItem::spread(Expr::var("a")),
        ArrayItem::keyed(Expr::string("a"), Expr::Int(1)),
        ArrayItem::positional(Expr::Int(16)),
        ArrayItem::positional(Expr::Int(23)),
    ]);
    assert_eq!(
        eval(&SourceIndex::new(), &[], &[first, spread]),
        "array{0: int(42), b: string(wow), a: int(1), 1: int(16), 2: int(23)}"
    );
}

#[test]
fn test_dim_assignment_builds_a_shape() {
    let push = Expr::assign(
        Expr::ArrayDimFetch {
            target: Box::new(Expr::var("row")),
            dim: None,
        },
        Expr::Int(1),
    );
    let keyed = Expr::assign(Expr::dim(Expr::var("row"), Expr::string("k")), Expr::string("v"));
    let source = SourceIndex::new();
    assert_eq!(
        eval(&source, &[], &[push.clone(), keyed.clone(), Expr::var("row")]),
        "array{0: int(1), k: string(v)}"
    );
    assert_eq!(
        eval(&source, &[], &[push, keyed, Expr::dim(Expr::var("row"), Expr::string("k"))]),
        "string(v)"
    );
}

#[test]
fn test_destructuring() {
    let value = assign("pair", Expr::list(vec![Expr::Int(1), Expr::string("x")]));
    let destructure = Expr::assign(
        Expr::list(vec![Expr::var("first"), Expr::var("second")]),
        Expr::var("pair"),
    );
    assert_eq!(
        eval(&SourceIndex::new(), &[], &[value, destructure, Expr::var("second")]),
        "string(x)"
    );
}

#[test]
fn test_ternary_and_short_ternary() {
    let source = SourceIndex::new();
    let ternary = Expr::Ternary {
        condition: Box::new(Expr::var("flag")),
        then: Some(Box::new(Expr::Int(1))),
        otherwise: Box::new(Expr::string("a")),
    };
    assert_eq!(eval(&source, &[], &[ternary]), "int(1)|string(a)");

    let short = Expr::Ternary {
        condition: Box::new(Expr::var("name")),
        then: None,
        otherwise: Box::new(Expr::string("anon")),
    };
    let bindings = [("name", Type::nullable(Type::String))];
    assert_eq!(eval(&source, &bindings, &[short]), "string|string(anon)");
}

#[test]
fn test_builtin_and_unresolved_calls() {
    let source = SourceIndex::new();
    assert_eq!(eval(&source, &[], &[Expr::call("strlen", vec![Expr::string("x")])]), "int");
    assert_eq!(eval(&source, &[], &[Expr::call("\\explode", Vec::new())]), "list<string>");
    assert_eq!(eval(&source, &[], &[Expr::call("missing", Vec::new())]), "unknown");
}

#[test]
fn test_constructor_binds_class_templates() {
    let source = classes();
    let boxed = Expr::new_object("Box", vec![Expr::Int(1)]);
    assert_eq!(eval(&source, &[], &[boxed.clone()]), "Box<int>");
    assert_eq!(eval(&source, &[], &[Expr::method_call(boxed, "get", Vec::new())]), "int");

    let unbound = Expr::new_object("Box", Vec::new());
    assert_eq!(eval(&source, &[], &[unbound]), "Box<mixed>");
}

#[test]
fn test_receiver_templates() {
    let source = classes();
    let bindings = [
        ("strings", Type::generic("Box", vec![Type::String])),
        ("bare", Type::generic("Box", Vec::new())),
        ("raw", Type::object("Box")),
    ];
    let get = |name: &str| Expr::method_call(Expr::var(name), "get", Vec::new());

    assert_eq!(eval(&source, &bindings, &[get("strings")]), "string");
    assert_eq!(
        eval(&source, &bindings, &[Expr::property(Expr::var("strings"), "value")]),
        "string"
    );
    // Missing template arguments read as `void`.
    assert_eq!(eval(&source, &bindings, &[get("bare")]), "void");
    assert_eq!(eval(&source, &bindings, &[get("raw")]), "mixed");
}

#[test]
fn test_fluent_return_is_the_receiver() {
    let source = classes();
    let call = |class: &str| {
        Expr::method_call(
            Expr::new_object(class, Vec::new()),
            "named",
            vec![Expr::string("x")],
        )
    };
    assert_eq!(eval(&source, &[], &[call("Builder")]), "Builder");
    assert_eq!(eval(&source, &[], &[call("ChildBuilder")]), "ChildBuilder");
}

#[test]
fn test_declared_static_returns_follow_the_receiver() {
    let source = classes();
    let on_child = |method: &str| {
        Expr::method_call(Expr::new_object("ChildBuilder", Vec::new()), method, Vec::new())
    };
    assert_eq!(eval(&source, &[], &[on_child("copy")]), "ChildBuilder");
    assert_eq!(eval(&source, &[], &[on_child("maybe")]), "ChildBuilder|null");
}

#[test]
fn test_own_class_returns_are_not_the_receiver() {
    let source = classes();
    let make = Expr::method_call(Expr::new_object("SubNode", Vec::new()), "make", Vec::new());
    assert_eq!(eval(&source, &[], &[make]), "Node");

    let bindings = [("ints", Type::generic("Box", vec![Type::Integer]))];
    let strings = Expr::method_call(Expr::var("ints"), "strings", Vec::new());
    assert_eq!(eval(&source, &bindings, &[strings]), "Box<string>");
}

#[test]
fn test_nullsafe_method_call() {
    let source = classes();
    let call = Expr::MethodCall {
        target: Box::new(Expr::var("maybe")),
        name: "get".to_string(),
        args: Vec::new(),
        nullsafe: true,
    };
    let bindings = [("maybe", Type::nullable(Type::generic("Box", vec![Type::Integer])))];
    assert_eq!(eval(&source, &bindings, &[call]), "int|null");
}

#[test]
fn test_class_constant() {
    let fetch = Expr::ClassConstFetch {
        class: ClassRef::Named("Box".to_string()),
        name: "class".to_string(),
    };
    assert_eq!(eval(&classes(), &[], &[fetch]), "string(Box)");
}

#[test]
fn test_arrow_function_type() {
    let arrow = Expr::ArrowFunction(Box::new(ArrowFunctionExpr {
        params: vec![Param::new("x")],
        return_hint: None,
        body: Expr::binary(BinaryOp::Concat, Expr::string("#"), Expr::Int(1)),
    }));
    assert_eq!(eval(&SourceIndex::new(), &[], &[arrow]), "(unknown): string(#1)");
}

#[test]
fn test_unsupported_construct_is_reported() {
    init_tracing();
    let source = SourceIndex::new();
    let ctx = Context::new(InferConfig::default());
    let engine = Engine::new(&source, &ctx);
    let imports = ImportTable::default();
    let mut scope = Scope::new(NameResolver::new(&imports), ctx.index());

    let expr = Expr::Unsupported {
        kind: "eval".to_string(),
    };
    assert_eq!(engine.infer_expression(&expr, &mut scope), Type::Unknown);
    let failures = engine.take_failures();
    assert!(matches!(
        failures.as_slice(),
        [crate::error::InferError::Unanalyzable { construct, .. }] if construct == "eval"
    ));
}

#[test]
fn test_match_without_default_may_throw() {
    init_tracing();
    let arms = |default: bool| {
        let mut arms = vec![MatchArm {
            conditions: vec![Expr::Int(1)],
            body: Expr::string("one"),
        }];
        if default {
            arms.push(MatchArm {
                conditions: Vec::new(),
                body: Expr::string("many"),
            });
        }
        arms
    };
    let function = |name: &str, default: bool| {
        FunctionDecl::new(name)
            .with_params(vec![Param::new("n")])
            .with_body(vec![Stmt::ret(Expr::Match {
                subject: Box::new(Expr::var("n")),
                arms: arms(default),
            })])
    };
    let source = crate::test_support::global_functions(vec![
        function("strict", false),
        function("total", true),
    ]);
    let ctx = Context::new(InferConfig::default());
    let engine = Engine::new(&source, &ctx);

    let strict = engine.function_definition("strict").unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(strict.return_type.to_string(), "string(one)");
    assert_eq!(strict.exceptions(), [Type::object("UnhandledMatchError")]);

    let total = engine.function_definition("total").unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(total.return_type.to_string(), "string");
    assert!(total.exceptions().is_empty());
}
