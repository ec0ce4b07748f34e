//! Declaration-only builder.
//!
//! Reads a unit's signature hints and doc tags without looking at its
//! body. The result is the unit's `Shallow` definition and, for abstract
//! and interface members, its only one.

use scry_ast::{ClassRef, Expr, FunctionDecl, Param, TypeHint, UnaryOp};
use scry_types::{KeyedArrayBuilder, NoHierarchy, Type, TypeParseError, parse_type_with};

use super::UnitEnv;
use crate::definition::{FunctionLikeDefinition, ParamDefinition, UnitId};
use crate::docblock::{DocBlock, names_receiver};
use crate::error::InferError;
use crate::precedence::{self, ReturnSignals};

/// Everything the signature says about a unit.
#[derive(Debug)]
pub struct DeclaredSignature {
    /// Parameters, `@throws` exceptions, templates; the return type is the
    /// best signature-only answer.
    pub definition: FunctionLikeDefinition,
    /// `@return` or the native return hint.
    pub declared_return: Option<Type>,
    /// The override tag, when present, parsed or not.
    pub override_return: Option<Result<Type, TypeParseError>>,
    pub failures: Vec<InferError>,
}

/// Build the signature of `decl`, the declaration behind `unit`.
pub fn build(
    unit: &UnitId,
    decl: &FunctionDecl,
    env: &UnitEnv<'_>,
    override_tag: &str,
) -> DeclaredSignature {
    let doc = decl
        .doc
        .as_ref()
        .map(|doc| DocBlock::parse(doc.text()))
        .unwrap_or_default();
    let mut failures = Vec::new();

    let params = decl
        .params
        .iter()
        .map(|param| param_definition(unit, param, &doc, env, &mut failures))
        .collect();

    let declared_return = declared_return(unit, decl, &doc, env, &mut failures);
    let override_return = doc.override_type(override_tag, env);

    let mut definition =
        FunctionLikeDefinition::new(decl.name.clone(), unit.clone()).with_params(params);
    definition.is_static = decl.is_static();
    definition.returns_receiver =
        signature_returns_receiver(decl, &doc, override_tag, &override_return);
    definition.templates = doc.templates(env);
    for thrown in doc.throws(env) {
        match thrown {
            Ok(ty) => definition.add_exception(ty),
            Err(source) => failures.push(InferError::IncompatibleOverride {
                unit: unit.clone(),
                tag: "throws".to_string(),
                source,
            }),
        }
    }

    // Signature-only precedence; override failures are reported once the
    // full definition is resolved.
    let signals = ReturnSignals {
        override_return: override_return.clone().and_then(Result::ok),
        declared: declared_return.clone(),
        inferred: None,
    };
    definition.return_type = precedence::select_return(signals, &NoHierarchy).ty;

    DeclaredSignature {
        definition,
        declared_return,
        override_return,
        failures,
    }
}

/// `static`/`$this` in the return text that decides the signature: a
/// parsed override, else `@return`, else the native hint.
fn signature_returns_receiver(
    decl: &FunctionDecl,
    doc: &DocBlock,
    override_tag: &str,
    override_return: &Option<Result<Type, TypeParseError>>,
) -> bool {
    let text = match override_return {
        Some(Ok(_)) => doc.override_text(override_tag),
        _ => doc.return_text(),
    };
    match text {
        Some(text) => names_receiver(text),
        None => decl
            .return_hint
            .as_ref()
            .is_some_and(|hint| names_receiver(&hint.to_string())),
    }
}

fn param_definition(
    unit: &UnitId,
    param: &Param,
    doc: &DocBlock,
    env: &UnitEnv<'_>,
    failures: &mut Vec<InferError>,
) -> ParamDefinition {
    let documented = match doc.param_type(&param.name, env) {
        Some(Ok(ty)) => Some(ty),
        Some(Err(source)) => {
            failures.push(InferError::IncompatibleOverride {
                unit: unit.clone(),
                tag: "param".to_string(),
                source,
            });
            None
        }
        None => None,
    };
    let default = param
        .default
        .as_ref()
        .map(|default| constant_type(default, env).unwrap_or(Type::Unknown));

    let mut ty = documented
        .or_else(|| hint_type(unit, param.hint.as_ref(), env, failures))
        .unwrap_or(Type::Unknown);
    // `int $x = null` is implicitly nullable.
    if matches!(default, Some(Type::Null))
        && !ty.is_nullable()
        && !matches!(ty, Type::Unknown | Type::Mixed)
    {
        ty = Type::nullable(ty);
    }

    ParamDefinition {
        name: param.name.clone(),
        ty,
        default,
        variadic: param.variadic,
    }
}

fn declared_return(
    unit: &UnitId,
    decl: &FunctionDecl,
    doc: &DocBlock,
    env: &UnitEnv<'_>,
    failures: &mut Vec<InferError>,
) -> Option<Type> {
    if let Some((tag, parsed)) = doc.return_type(env) {
        match parsed {
            Ok(ty) => return Some(ty),
            Err(source) => failures.push(InferError::IncompatibleOverride {
                unit: unit.clone(),
                tag: tag.to_string(),
                source,
            }),
        }
    }
    hint_type(unit, decl.return_hint.as_ref(), env, failures)
}

/// Type of a native hint. Hints use the same grammar as doc tags.
pub fn hint_type(
    unit: &UnitId,
    hint: Option<&TypeHint>,
    env: &UnitEnv<'_>,
    failures: &mut Vec<InferError>,
) -> Option<Type> {
    let hint = hint?;
    match parse_type_with(&hint.to_string(), env) {
        Ok(ty) => Some(ty),
        Err(_) => {
            failures.push(InferError::Unanalyzable {
                unit: unit.clone(),
                construct: format!("type hint `{hint}`"),
            });
            None
        }
    }
}

/// Type of a constant expression (parameter defaults, property
/// initialisers). `None` when the expression is not constant.
pub fn constant_type(expr: &Expr, env: &UnitEnv<'_>) -> Option<Type> {
    let ty = match expr {
        Expr::Int(value) => Type::int_literal(*value),
        Expr::Float(value) => Type::float_literal(*value),
        Expr::String(value) => Type::string_literal(value.clone()),
        Expr::Bool(value) => Type::bool_literal(*value),
        Expr::Null => Type::Null,
        Expr::Unary {
            op: UnaryOp::Minus,
            operand,
        } => match operand.as_ref() {
            Expr::Int(value) => Type::int_literal(value.checked_neg()?),
            Expr::Float(value) => Type::float_literal(-value),
            _ => return None,
        },
        Expr::ClassConstFetch {
            class: ClassRef::Named(class),
            name,
        } if name.eq_ignore_ascii_case("class") => Type::string_literal(env.resolve_class(class)),
        Expr::Array(items) => {
            let mut builder = KeyedArrayBuilder::new();
            for item in items {
                let value = constant_type(&item.value, env)?;
                match (&item.key, item.unpack) {
                    (_, true) => builder.spread(&value),
                    (Some(key), false) => builder.push_dynamic(constant_type(key, env)?, value),
                    (None, false) => builder.push_positional(value),
                }
            }
            builder.finish()
        }
        _ => return None,
    };
    Some(ty)
}

#[cfg(test)]
#[path = "../../tests/declaration_tests.rs"]
mod tests;
