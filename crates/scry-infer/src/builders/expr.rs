//! Expression inference for the body-dataflow builder.
//!
//! Registered expression hooks are asked first; the first definitive
//! answer replaces the built-in rules below for that node. Anything the
//! rules cannot model yields `unknown`.

use scry_ast::{
    Arg, ArrayItem, ArrowFunctionExpr, BinaryOp, CastKind, ClassRef, ClosureExpr, Expr, MatchArm,
    Param, UnaryOp,
};
use scry_types::{
    ArrayKey, ArrayType, FunctionParam, FunctionType, KeyedArrayBuilder, KeyedArrayType,
    LiteralType, TemplateSubstitution, TemplateType, Type, Union, instantiate_type,
    same_class_name,
};
use tracing::debug;

use super::body::{BodyAnalyzer, empty_shape, iteration_types, param_binding};
use super::declaration::{constant_type, hint_type};
use crate::definition::{FunctionLikeDefinition, ParamDefinition};
use crate::precedence::{self, ReturnSignals};
use crate::scope::{Scope, merge_bindings};

impl BodyAnalyzer<'_, '_> {
    pub(crate) fn infer_expr(&mut self, expr: &Expr, scope: &mut Scope<'_>) -> Type {
        if !self.nesting.enter() {
            self.unanalyzable("deeply nested expression");
            return Type::Unknown;
        }
        let decided = self.engine.context().broker().infer_expression(expr, scope);
        let ty = match decided {
            Some(ty) => ty,
            None => self.infer_builtin(expr, scope),
        };
        self.nesting.leave();
        ty
    }

    fn infer_builtin(&mut self, expr: &Expr, scope: &mut Scope<'_>) -> Type {
        match expr {
            Expr::Int(value) => Type::int_literal(*value),
            Expr::Float(value) => Type::float_literal(*value),
            Expr::String(value) => Type::string_literal(value.clone()),
            Expr::Bool(value) => Type::bool_literal(*value),
            Expr::Null => Type::Null,
            Expr::InterpolatedString(parts) => {
                for part in parts {
                    self.infer_expr(part, scope);
                }
                Type::String
            }
            Expr::Array(items) => self.infer_array(items, scope),
            Expr::Variable(name) => scope.lookup(name).unwrap_or(Type::Unknown),
            Expr::Assign { target, value } => {
                let ty = self.infer_expr(value, scope);
                self.assign(target, ty.clone(), scope);
                ty
            }
            Expr::ArrayDimFetch { target, dim } => {
                let container = self.infer_expr(target, scope);
                match dim {
                    Some(dim) => {
                        let key = self.infer_expr(dim, scope);
                        element_type(&container, &key)
                    }
                    None => {
                        self.unanalyzable("`[]` read outside an assignment");
                        Type::Unknown
                    }
                }
            }
            Expr::PropertyFetch {
                target,
                name,
                nullsafe,
            } => {
                let receiver = self.infer_expr(target, scope);
                self.property_fetch(&receiver, name, *nullsafe)
            }
            Expr::ClassConstFetch { class, name } => {
                if !name.eq_ignore_ascii_case("class") {
                    return Type::Unknown;
                }
                match self.class_ref_name(class, scope) {
                    Some(class) => Type::string_literal(class),
                    None => Type::String,
                }
            }
            Expr::Binary { op, left, right } => {
                let left = self.infer_expr(left, scope);
                let right = self.infer_expr(right, scope);
                binary_type(*op, &left, &right)
            }
            Expr::Unary { op, operand } => {
                let operand = self.infer_expr(operand, scope);
                unary_type(*op, &operand)
            }
            Expr::Ternary {
                condition,
                then,
                otherwise,
            } => self.infer_ternary(condition, then.as_deref(), otherwise, scope),
            Expr::Cast { kind, expr } => {
                let inner = self.infer_expr(expr, scope);
                cast_type(*kind, &inner)
            }
            Expr::New { class, args } => {
                let arg_types = self.infer_args(args, scope);
                match self.class_ref_name(class, scope) {
                    Some(class) => self.instantiate_class(&class, args, &arg_types),
                    None => Type::Unknown,
                }
            }
            Expr::FuncCall { name, args } => {
                let arg_types = self.infer_args(args, scope);
                self.function_call(name, args, &arg_types)
            }
            Expr::MethodCall {
                target,
                name,
                args,
                nullsafe,
            } => {
                let receiver = self.infer_expr(target, scope);
                let arg_types = self.infer_args(args, scope);
                self.method_call(&receiver, name, args, &arg_types, *nullsafe)
            }
            Expr::StaticCall { class, name, args } => {
                let arg_types = self.infer_args(args, scope);
                self.static_call(class, name, args, &arg_types, scope)
            }
            Expr::Closure(closure) => self.infer_closure(closure, scope),
            Expr::ArrowFunction(arrow) => self.infer_arrow(arrow, scope),
            Expr::Match { subject, arms } => self.infer_match(subject, arms, scope),
            Expr::Isset(exprs) => {
                for expr in exprs {
                    self.infer_expr(expr, scope);
                }
                Type::Boolean
            }
            Expr::Empty(expr) | Expr::Instanceof { expr, .. } => {
                self.infer_expr(expr, scope);
                Type::Boolean
            }
            Expr::Throw(value) => {
                let thrown = self.infer_expr(value, scope);
                self.record_thrown(&thrown);
                Type::Void
            }
            Expr::Unsupported { kind } => {
                self.unanalyzable(kind.clone());
                Type::Unknown
            }
        }
    }

    fn infer_args(&mut self, args: &[Arg], scope: &mut Scope<'_>) -> Vec<Type> {
        let mut types = Vec::with_capacity(args.len());
        for arg in args {
            types.push(self.infer_expr(&arg.value, scope));
        }
        types
    }

    fn infer_array(&mut self, items: &[ArrayItem], scope: &mut Scope<'_>) -> Type {
        let mut builder = KeyedArrayBuilder::new();
        for item in items {
            if item.unpack {
                let spread = self.infer_expr(&item.value, scope);
                builder.spread(&spread);
                continue;
            }
            match &item.key {
                Some(key) => {
                    let key = self.infer_expr(key, scope);
                    let value = self.infer_expr(&item.value, scope);
                    builder.push_dynamic(key, value);
                }
                None => {
                    let value = self.infer_expr(&item.value, scope);
                    builder.push_positional(value);
                }
            }
        }
        builder.finish()
    }

    fn infer_ternary(
        &mut self,
        condition: &Expr,
        then: Option<&Expr>,
        otherwise: &Expr,
        scope: &mut Scope<'_>,
    ) -> Type {
        let condition = self.infer_expr(condition, scope);
        let entry = scope.snapshot();
        let then_type = match then {
            Some(then) => self.infer_expr(then, scope),
            None => condition.without_null(),
        };
        let then_bindings = scope.snapshot();
        scope.restore(entry);
        let else_type = self.infer_expr(otherwise, scope);
        let else_bindings = scope.snapshot();
        scope.restore(merge_bindings(&[then_bindings, else_bindings]));
        join([then_type, else_type])
    }

    fn infer_match(&mut self, subject: &Expr, arms: &[MatchArm], scope: &mut Scope<'_>) -> Type {
        self.infer_expr(subject, scope);
        let mut results = Vec::with_capacity(arms.len());
        let mut has_default = false;
        for arm in arms {
            has_default |= arm.conditions.is_empty();
            for condition in &arm.conditions {
                self.infer_expr(condition, scope);
            }
            results.push(self.infer_expr(&arm.body, scope));
        }
        if !has_default {
            self.record_thrown(&Type::object("UnhandledMatchError"));
        }
        join(results)
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    fn assign(&mut self, target: &Expr, value: Type, scope: &mut Scope<'_>) {
        match target {
            Expr::Variable(name) if name != "this" => scope.bind(name.clone(), value),
            Expr::ArrayDimFetch {
                target: container,
                dim,
            } => {
                let current = self.current_value(container, scope);
                let key = match dim {
                    Some(dim) => Some(self.infer_expr(dim, scope)),
                    None => None,
                };
                let updated = with_element(current, key, value);
                self.assign(container, updated, scope);
            }
            Expr::Array(items) => self.destructure(items, &value, scope),
            Expr::PropertyFetch { target, .. } => {
                self.infer_expr(target, scope);
            }
            _ => {}
        }
    }

    /// Current type of an assignment target; `None` for unset variables.
    fn current_value(&mut self, target: &Expr, scope: &mut Scope<'_>) -> Option<Type> {
        match target {
            Expr::Variable(name) => scope.lookup(name),
            Expr::ArrayDimFetch {
                target,
                dim: Some(dim),
            } => {
                let container = self.current_value(target, scope)?;
                let key = self.infer_expr(dim, scope);
                Some(element_type(&container, &key))
            }
            _ => Some(self.infer_expr(target, scope)),
        }
    }

    /// `[$a, 'k' => $b] = $value`
    fn destructure(&mut self, items: &[ArrayItem], value: &Type, scope: &mut Scope<'_>) {
        for (position, item) in items.iter().enumerate() {
            let key = match &item.key {
                Some(key) => self.infer_expr(key, scope),
                None => Type::int_literal(position as i64),
            };
            let element = element_type(value, &key);
            self.assign(&item.value, element, scope);
        }
    }

    // =========================================================================
    // Classes and calls
    // =========================================================================

    fn class_ref_name(&mut self, class: &ClassRef, scope: &mut Scope<'_>) -> Option<String> {
        match class {
            ClassRef::Named(name) => Some(self.env.resolve_class(name)),
            ClassRef::SelfRef | ClassRef::Static => {
                self.env.resolver().self_class().map(str::to_string)
            }
            ClassRef::Parent => self.env.resolver().parent_class().map(str::to_string),
            ClassRef::Dynamic(expr) => match self.infer_expr(expr, scope) {
                Type::Literal(LiteralType::String(name)) => {
                    Some(name.trim_start_matches('\\').to_string())
                }
                other => other.class_name().map(str::to_string),
            },
        }
    }

    fn instantiate_class(&mut self, class: &str, args: &[Arg], arg_types: &[Type]) -> Type {
        let templates = self.engine.class_templates(class);
        let constructor = self.engine.method_definition(class, "__construct").ok();
        if let Some(constructor) = &constructor {
            self.record_call_exceptions(constructor);
        }
        if templates.is_empty() {
            return Type::object(class);
        }

        let mut bound = TemplateSubstitution::new();
        if let Some(constructor) = &constructor {
            bind_arguments(&constructor.params, args, arg_types, &mut bound);
        }
        let args = templates
            .iter()
            .map(|template| {
                bound
                    .get(&template.name)
                    .cloned()
                    .unwrap_or_else(|| unbound(template))
            })
            .collect();
        Type::generic(class, args)
    }

    fn function_call(&mut self, name: &str, args: &[Arg], arg_types: &[Type]) -> Type {
        let engine = self.engine;
        let definition = self
            .env
            .resolver()
            .function_candidates(name)
            .iter()
            .find_map(|candidate| engine.function_definition(candidate).ok());
        match definition {
            Some(definition) => self.call_result(&definition, args, arg_types, None),
            None => {
                debug!(unit = %self.unit, function = name, "unresolved function call");
                Type::Unknown
            }
        }
    }

    fn method_call(
        &mut self,
        receiver: &Type,
        name: &str,
        args: &[Arg],
        arg_types: &[Type],
        nullsafe: bool,
    ) -> Type {
        let mut results = Vec::new();
        for member in receiver.members() {
            let result = match member {
                Type::Null => continue,
                Type::Function(function)
                    if name.eq_ignore_ascii_case("__invoke") || name.eq_ignore_ascii_case("call") =>
                {
                    (*function.return_type).clone()
                }
                _ => match member.class_name() {
                    Some(class) => match self.engine.method_definition(class, name) {
                        Ok(definition) => self.call_result(&definition, args, arg_types, Some(member)),
                        Err(_) => {
                            debug!(unit = %self.unit, class, method = name, "unresolved method call");
                            Type::Unknown
                        }
                    },
                    None => Type::Unknown,
                },
            };
            results.push(result);
        }
        if nullsafe && receiver.is_nullable() {
            results.push(Type::Null);
        }
        if results.is_empty() {
            return Type::Unknown;
        }
        join(results)
    }

    fn static_call(
        &mut self,
        class: &ClassRef,
        name: &str,
        args: &[Arg],
        arg_types: &[Type],
        scope: &mut Scope<'_>,
    ) -> Type {
        let Some(class_name) = self.class_ref_name(class, scope) else {
            return Type::Unknown;
        };
        let receiver = match class {
            ClassRef::Named(_) | ClassRef::Dynamic(_) => Type::object(class_name.as_str()),
            ClassRef::SelfRef | ClassRef::Static | ClassRef::Parent => scope
                .this_type()
                .cloned()
                .unwrap_or_else(|| Type::object(class_name.as_str())),
        };
        match self.engine.method_definition(&class_name, name) {
            Ok(definition) => self.call_result(&definition, args, arg_types, Some(&receiver)),
            Err(_) => {
                debug!(unit = %self.unit, class = %class_name, method = name, "unresolved static call");
                Type::Unknown
            }
        }
    }

    /// Return type of a resolved call, with the receiver's class templates
    /// and the callee's own templates substituted.
    fn call_result(
        &mut self,
        definition: &FunctionLikeDefinition,
        args: &[Arg],
        arg_types: &[Type],
        receiver: Option<&Type>,
    ) -> Type {
        self.record_call_exceptions(definition);

        let mut subst = match receiver {
            Some(receiver) => self.receiver_substitution(receiver),
            None => TemplateSubstitution::new(),
        };
        if !definition.templates.is_empty() {
            let mut own = TemplateSubstitution::new();
            bind_arguments(&definition.params, args, arg_types, &mut own);
            for template in &definition.templates {
                let ty = own
                    .get(&template.name)
                    .cloned()
                    .unwrap_or_else(|| unbound(template));
                subst.insert(template.name.clone(), ty);
            }
        }
        let ty = instantiate_type(&definition.return_type, &subst);

        if !definition.returns_receiver {
            return ty;
        }
        match (receiver, definition.defining_unit.class()) {
            (Some(receiver), Some(declaring)) => Union::wrap(ty.members().iter().map(|member| {
                if member.class_name().is_some_and(|name| same_class_name(name, declaring)) {
                    receiver.clone()
                } else {
                    member.clone()
                }
            })),
            _ => ty,
        }
    }

    /// Whether `expr` evaluates to the late-static receiver: `$this`,
    /// `new static`, or a receiver-returning call made on the receiver.
    pub(crate) fn yields_receiver(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Variable(name) => name == "this",
            Expr::New {
                class: ClassRef::Static,
                ..
            } => true,
            Expr::MethodCall { target, name, .. } => {
                self.yields_receiver(target) && self.own_method_returns_receiver(name)
            }
            Expr::StaticCall {
                class: ClassRef::Static | ClassRef::SelfRef,
                name,
                ..
            } => self.own_method_returns_receiver(name),
            _ => false,
        }
    }

    fn own_method_returns_receiver(&self, name: &str) -> bool {
        let Some(class) = self.env.resolver().self_class() else {
            return false;
        };
        self.engine
            .method_definition(class, name)
            .is_ok_and(|definition| definition.returns_receiver)
    }

    /// Class templates of the receiver's class bound to its type arguments.
    ///
    /// Missing arguments of a generic receiver are `void`; a raw class
    /// reference leaves every template at its bound.
    fn receiver_substitution(&self, receiver: &Type) -> TemplateSubstitution {
        match receiver {
            Type::Generic(generic) => {
                let templates = self.engine.class_templates(&generic.name);
                TemplateSubstitution::from_pairs(&templates, &generic.args)
            }
            Type::Object(object) => {
                let mut subst = TemplateSubstitution::new();
                for template in self.engine.class_templates(&object.name) {
                    let ty = unbound(&template);
                    subst.insert(template.name, ty);
                }
                subst
            }
            _ => TemplateSubstitution::new(),
        }
    }

    fn property_fetch(&mut self, receiver: &Type, name: &str, nullsafe: bool) -> Type {
        let mut results = Vec::new();
        for member in receiver.members() {
            if matches!(member, Type::Null) {
                continue;
            }
            let ty = member
                .class_name()
                .and_then(|class| self.engine.property_type(class, name))
                .map(|ty| instantiate_type(&ty, &self.receiver_substitution(member)))
                .unwrap_or(Type::Unknown);
            results.push(ty);
        }
        if nullsafe && receiver.is_nullable() {
            results.push(Type::Null);
        }
        if results.is_empty() {
            return Type::Unknown;
        }
        join(results)
    }

    fn record_call_exceptions(&mut self, callee: &FunctionLikeDefinition) {
        if !self.engine.config().infer_thrown_from_calls {
            return;
        }
        for exception in callee.exceptions() {
            self.record_thrown(exception);
        }
    }

    // =========================================================================
    // Closures
    // =========================================================================

    fn infer_closure(&mut self, closure: &ClosureExpr, scope: &mut Scope<'_>) -> Type {
        let mut child = if closure.is_static {
            scope.static_child()
        } else {
            scope.child()
        };
        let params = self.bind_params(&closure.params, &mut child);
        let (inferred, thrown) = self.analyze_nested(&closure.body, &mut child);
        let return_type = self.closure_return(closure.return_hint.as_ref(), inferred);
        Type::Function(FunctionType::new(params, return_type).with_exceptions(thrown))
    }

    fn infer_arrow(&mut self, arrow: &ArrowFunctionExpr, scope: &mut Scope<'_>) -> Type {
        let mut child = scope.child();
        let params = self.bind_params(&arrow.params, &mut child);
        let (inferred, thrown) = self.evaluate_nested(&arrow.body, &mut child);
        let return_type = self.closure_return(arrow.return_hint.as_ref(), inferred);
        Type::Function(FunctionType::new(params, return_type).with_exceptions(thrown))
    }

    fn closure_return(&mut self, hint: Option<&scry_ast::TypeHint>, inferred: Type) -> Type {
        let declared = hint_type(self.unit, hint, self.env, &mut self.failures);
        let signals = ReturnSignals {
            override_return: None,
            declared,
            inferred: Some(inferred),
        };
        precedence::select_return(signals, self.engine.reflector()).ty
    }

    fn bind_params(&mut self, params: &[Param], scope: &mut Scope<'_>) -> Vec<FunctionParam> {
        let mut signature = Vec::with_capacity(params.len());
        for param in params {
            let ty = hint_type(self.unit, param.hint.as_ref(), self.env, &mut self.failures)
                .unwrap_or(Type::Unknown);
            let has_default = param.default.is_some();
            let default = param
                .default
                .as_ref()
                .and_then(|default| constant_type(default, self.env));
            let local = match default {
                Some(default) if param.hint.is_none() => default.widen(),
                _ => ty.clone(),
            };
            scope.bind(param.name.clone(), param_binding(local, param.variadic));
            signature.push(FunctionParam {
                name: param.name.clone(),
                ty,
                has_default,
                variadic: param.variadic,
            });
        }
        signature
    }
}

// =============================================================================
// Type rules
// =============================================================================

/// Union of branch results; branches that never complete (`void`, e.g. a
/// throw expression) contribute nothing.
fn join(types: impl IntoIterator<Item = Type>) -> Type {
    Union::wrap(types.into_iter().filter(|ty| !ty.is_void()))
}

fn unbound(template: &TemplateType) -> Type {
    template.bound.as_deref().cloned().unwrap_or(Type::Mixed)
}

fn key_literal(key: &Type) -> Option<ArrayKey> {
    match key {
        Type::Literal(literal) => ArrayKey::from_literal(literal),
        _ => None,
    }
}

/// Type of `container[key]`.
fn element_type(container: &Type, key: &Type) -> Type {
    match container {
        Type::KeyedArray(shape) => match key_literal(key) {
            Some(key) => shape
                .get(&key)
                .map(|item| item.value.clone())
                .unwrap_or(Type::Null),
            None if shape.is_empty() => Type::Null,
            None => shape.value_type(),
        },
        Type::Array(array) => (*array.value).clone(),
        Type::String | Type::Literal(LiteralType::String(_)) => Type::String,
        Type::Generic(generic) => generic.args.last().cloned().unwrap_or(Type::Mixed),
        Type::Union(union) => join(
            union
                .iter()
                .filter(|member| !matches!(member, Type::Null))
                .map(|member| element_type(member, key)),
        ),
        Type::Mixed => Type::Mixed,
        _ => Type::Unknown,
    }
}

/// Container type after `container[key] = value` (`key` is `None` for
/// `container[] = value`).
fn with_element(container: Option<Type>, key: Option<Type>, value: Type) -> Type {
    let shape = match container {
        None | Some(Type::Null | Type::Unknown | Type::Void) => empty_shape(),
        Some(Type::KeyedArray(shape)) => shape,
        Some(Type::Array(array)) => {
            let is_list = array.is_list && key.is_none();
            let key = key.map_or(Type::Integer, |key| key.widen());
            return Type::Array(ArrayType {
                key: Box::new(Union::wrap([*array.key, key])),
                value: Box::new(Union::wrap([*array.value, value])),
                is_list,
            });
        }
        Some(other) => return other,
    };

    let Some(key) = key else {
        return Type::KeyedArray(shape.with_pushed(value));
    };
    if let Some(literal) = key_literal(&key) {
        return Type::KeyedArray(shape.with_item(literal, value));
    }
    degrade_shape(&shape, key.widen(), value)
}

fn degrade_shape(shape: &KeyedArrayType, key: Type, value: Type) -> Type {
    if shape.is_empty() {
        return Type::Array(ArrayType::new(key, value));
    }
    Type::Array(ArrayType::new(
        Union::wrap([shape.key_type().widen(), key]),
        Union::wrap([shape.value_type(), value]),
    ))
}

/// Arguments bind templates that occur in the matching parameter types.
fn bind_arguments(
    params: &[ParamDefinition],
    args: &[Arg],
    arg_types: &[Type],
    subst: &mut TemplateSubstitution,
) {
    let mut position = 0;
    for (arg, ty) in args.iter().zip(arg_types) {
        let param = match &arg.name {
            Some(name) => params.iter().find(|param| &param.name == name),
            None => {
                let param = params
                    .get(position)
                    .or_else(|| params.last().filter(|param| param.variadic));
                position += 1;
                param
            }
        };
        let Some(param) = param else {
            continue;
        };
        if arg.unpack {
            unify(&param.ty, &iteration_types(ty).1, subst);
        } else {
            unify(&param.ty, ty, subst);
        }
    }
}

/// Bind the templates of `param` against `arg`; first binding wins.
fn unify(param: &Type, arg: &Type, subst: &mut TemplateSubstitution) {
    match (param, arg) {
        (Type::Template(template), _) => {
            if subst.get(&template.name).is_none() && !arg.is_unknown() {
                subst.insert(template.name.clone(), arg.widen());
            }
        }
        (Type::Union(union), _) => {
            let arg = arg.without_null();
            for member in union.iter().filter(|member| !matches!(member, Type::Null)) {
                unify(member, &arg, subst);
            }
        }
        (Type::Array(param), Type::Array(arg)) => {
            unify(&param.key, &arg.key, subst);
            unify(&param.value, &arg.value, subst);
        }
        (Type::Array(param), Type::KeyedArray(arg)) if !arg.is_empty() => {
            let arg = arg.to_array_type();
            unify(&param.key, &arg.key, subst);
            unify(&param.value, &arg.value, subst);
        }
        (Type::Generic(param), Type::Generic(arg))
            if same_class_name(&param.name, &arg.name) && param.args.len() == arg.args.len() =>
        {
            for (param, arg) in param.args.iter().zip(&arg.args) {
                unify(param, arg, subst);
            }
        }
        (Type::Function(param), Type::Function(arg)) => {
            unify(&param.return_type, &arg.return_type, subst);
        }
        _ => {}
    }
}

fn int_value(ty: &Type) -> Option<i64> {
    match ty {
        Type::Literal(LiteralType::Integer(value)) => Some(*value),
        _ => None,
    }
}

fn is_int_like(ty: &Type) -> bool {
    matches!(ty, Type::Integer | Type::Literal(LiteralType::Integer(_)))
}

fn is_float_like(ty: &Type) -> bool {
    matches!(ty, Type::Float | Type::Literal(LiteralType::Float(_)))
}

fn is_array_like(ty: &Type) -> bool {
    matches!(ty, Type::Array(_) | Type::KeyedArray(_))
}

fn int_or_float() -> Type {
    Union::wrap([Type::Integer, Type::Float])
}

fn numeric_result(left: &Type, right: &Type) -> Type {
    let numeric = |ty: &Type| is_int_like(ty) || is_float_like(ty);
    if is_int_like(left) && is_int_like(right) {
        Type::Integer
    } else if numeric(left) && numeric(right) {
        Type::Float
    } else {
        int_or_float()
    }
}

/// String value of a literal as PHP converts it for concatenation.
fn string_value(ty: &Type) -> Option<String> {
    match ty {
        Type::Literal(LiteralType::String(value)) => Some(value.clone()),
        Type::Literal(LiteralType::Integer(value)) => Some(value.to_string()),
        Type::Literal(LiteralType::Boolean(true)) => Some("1".to_string()),
        Type::Literal(LiteralType::Boolean(false)) | Type::Null => Some(String::new()),
        _ => None,
    }
}

fn binary_type(op: BinaryOp, left: &Type, right: &Type) -> Type {
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            if let (Some(a), Some(b)) = (int_value(left), int_value(right)) {
                let folded = match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    _ => a.checked_mul(b),
                };
                // Integer overflow yields a float.
                return folded.map_or(Type::Float, Type::int_literal);
            }
            if op == BinaryOp::Add && is_array_like(left) && is_array_like(right) {
                return array_union(left, right);
            }
            numeric_result(left, right)
        }
        BinaryOp::Div => {
            if is_float_like(left) || is_float_like(right) {
                Type::Float
            } else {
                int_or_float()
            }
        }
        BinaryOp::Pow => numeric_result(left, right),
        BinaryOp::Mod | BinaryOp::Spaceship => Type::Integer,
        op if op.is_bitwise() => Type::Integer,
        BinaryOp::Concat => match (string_value(left), string_value(right)) {
            (Some(a), Some(b)) => Type::string_literal(a + &b),
            _ => Type::String,
        },
        BinaryOp::Coalesce => match left {
            Type::Null => right.clone(),
            Type::Unknown => Type::Unknown,
            _ => Union::wrap([left.without_null(), right.clone()]),
        },
        _ => Type::Boolean,
    }
}

/// `$a + $b` on arrays: keys of `$a` win, keys only in `$b` are appended.
fn array_union(left: &Type, right: &Type) -> Type {
    match (left, right) {
        (Type::KeyedArray(left), Type::KeyedArray(right)) => {
            let mut merged = left.clone();
            for item in right.items() {
                if merged.get(&item.key).is_none() {
                    merged = merged.with_item(item.key.clone(), item.value.clone());
                }
            }
            Type::KeyedArray(merged)
        }
        _ => {
            let (left, right) = (as_array(left), as_array(right));
            Type::Array(ArrayType::new(
                Union::wrap([*left.key, *right.key]),
                Union::wrap([*left.value, *right.value]),
            ))
        }
    }
}

fn as_array(ty: &Type) -> ArrayType {
    match ty {
        Type::KeyedArray(shape) => shape.to_array_type(),
        Type::Array(array) => array.clone(),
        _ => ArrayType::of(Type::Mixed),
    }
}

fn unary_type(op: UnaryOp, operand: &Type) -> Type {
    match op {
        UnaryOp::Not => Type::Boolean,
        UnaryOp::BitNot => Type::Integer,
        UnaryOp::Minus => match operand {
            Type::Literal(LiteralType::Integer(value)) => {
                value.checked_neg().map_or(Type::Float, Type::int_literal)
            }
            Type::Literal(LiteralType::Float(value)) => Type::float_literal(-value),
            Type::Integer | Type::Float => operand.clone(),
            _ => int_or_float(),
        },
        UnaryOp::Plus if is_int_like(operand) || is_float_like(operand) => operand.clone(),
        UnaryOp::Plus => int_or_float(),
    }
}

fn cast_type(kind: CastKind, inner: &Type) -> Type {
    match kind {
        CastKind::Int => match inner {
            Type::Literal(LiteralType::Integer(_)) => inner.clone(),
            Type::Literal(LiteralType::Boolean(value)) => Type::int_literal(i64::from(*value)),
            _ => Type::Integer,
        },
        CastKind::Float => Type::Float,
        CastKind::String => match string_value(inner) {
            Some(value) => Type::string_literal(value),
            None => Type::String,
        },
        CastKind::Bool => Type::Boolean,
        CastKind::Array => match inner {
            Type::Array(_) | Type::KeyedArray(_) => inner.clone(),
            Type::Null => Type::KeyedArray(empty_shape()),
            _ => Type::array_of(Type::Mixed),
        },
        CastKind::Object => match inner {
            Type::Object(_) | Type::Generic(_) => inner.clone(),
            _ => Type::object("stdClass"),
        },
    }
}

#[cfg(test)]
#[path = "../../tests/expr_tests.rs"]
mod tests;
