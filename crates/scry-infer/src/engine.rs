//! The inference engine.
//!
//! Builds `FunctionLikeDefinition`s on demand. For a unit id:
//!
//! 1. an index entry (`Shallow` or `Full`) is served as is
//! 2. units the reflector cannot find fall back to the built-in tables;
//!    without either the result is `NotFound`
//! 3. inherited members are built once, for their declaring unit
//! 4. otherwise the declaration builder produces the signature, which is
//!    inserted as a `Shallow` entry before the body is analysed; the body
//!    result goes through the precedence policy and the definition hooks
//!    and replaces the entry as `Full`
//!
//! Calls found in a body request their callee's definition from the same
//! engine, so building one unit may build many. Recursive calls observe the
//! `Shallow` entry; a depth guard bounds everything else.
//!
//! Failures are collected, never raised: `analyze` returns them per run in
//! an `AnalysisReport`, together with the built definitions. A panic inside
//! one unit's analysis (typically from a hook) is caught where that unit is
//! built and reported as `UnitFailure` for it. The unit is completed with
//! its signature, so callers keep working and later requests do not re-run
//! the failing analysis.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};

use scry_ast::{Expr, PropertyDecl, SourceIndex};
use scry_types::{TemplateType, Type, TypeParseError};
use tracing::{debug, trace, warn};

use crate::builders::body::{BodyAnalyzer, BodyOutcome, param_binding};
use crate::builders::declaration::{self, DeclaredSignature, constant_type, hint_type};
use crate::builders::{UnitEnv, reflection};
use crate::config::InferConfig;
use crate::context::Context;
use crate::definition::{ClassDefinition, FunctionLikeDefinition, UnitId};
use crate::docblock::DocBlock;
use crate::error::InferError;
use crate::precedence::{self, ReturnSignals, ReturnSource};
use crate::recursion::{RecursionGuard, RecursionProfile};
use crate::reflector::{ResolvedUnit, SourceReflector};
use crate::report::AnalysisReport;
use crate::scope::Scope;

/// Definition builds allowed while building one requested unit.
const MAX_BUILDS: u32 = 100_000;

pub struct Engine<'s> {
    source: &'s SourceIndex,
    ctx: &'s Context,
    reflector: SourceReflector<'s>,
    guard: RefCell<RecursionGuard<UnitId>>,
    failures: RefCell<Vec<InferError>>,
}

impl<'s> Engine<'s> {
    pub fn new(source: &'s SourceIndex, ctx: &'s Context) -> Self {
        let profile = RecursionProfile::Custom {
            max_depth: ctx.config().max_call_depth,
            max_iterations: MAX_BUILDS,
        };
        Self {
            source,
            ctx,
            reflector: SourceReflector::new(source),
            guard: RefCell::new(RecursionGuard::with_profile(profile)),
            failures: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &'s InferConfig {
        self.ctx.config()
    }

    pub fn context(&self) -> &'s Context {
        self.ctx
    }

    pub fn reflector(&self) -> &SourceReflector<'s> {
        &self.reflector
    }

    // =========================================================================
    // Definitions
    // =========================================================================

    /// The definition of `unit`, built on first request.
    #[tracing::instrument(level = "trace", skip(self, unit), fields(unit = %unit))]
    pub fn definition(&self, unit: &UnitId) -> Result<FunctionLikeDefinition, InferError> {
        if let Some(entry) = self.ctx.index().get(unit) {
            trace!(maturity = ?entry.maturity, "engine: index hit");
            return Ok(entry.definition);
        }

        let resolved = match self.reflector.resolve(unit) {
            Ok(resolved) => resolved,
            Err(err) => {
                return match self.builtin_definition(unit) {
                    Some(definition) => Ok(definition),
                    None => Err(err),
                };
            }
        };
        if resolved.declaring.normalized() != unit.normalized() {
            trace!(declaring = %resolved.declaring, "engine: inherited member");
            return self.definition(&resolved.declaring);
        }
        Ok(self.build(unit, &resolved))
    }

    pub fn function_definition(&self, name: &str) -> Result<FunctionLikeDefinition, InferError> {
        self.definition(&UnitId::function(name))
    }

    pub fn method_definition(
        &self,
        class: &str,
        name: &str,
    ) -> Result<FunctionLikeDefinition, InferError> {
        self.definition(&UnitId::method(class, name))
    }

    fn builtin_definition(&self, unit: &UnitId) -> Option<FunctionLikeDefinition> {
        match unit {
            UnitId::Function(name) => reflection::builtin_function(name),
            UnitId::Method { class, name } => self
                .reflector
                .ancestor_names(class)
                .iter()
                .find_map(|ancestor| reflection::builtin_method(ancestor, name)),
            UnitId::Script => None,
        }
    }

    fn build(&self, unit: &UnitId, resolved: &ResolvedUnit<'s>) -> FunctionLikeDefinition {
        let env = UnitEnv::for_unit(&self.reflector, resolved);
        let DeclaredSignature {
            definition: shallow,
            declared_return,
            override_return,
            failures,
        } = declaration::build(unit, resolved.decl, &env, &self.config().override_tag);
        self.record_all(failures);

        let key = unit.normalized();
        let entered = self.guard.borrow_mut().enter(&key);
        if !entered.is_entered() {
            debug!(unit = %unit, result = ?entered, "engine: build refused, serving signature");
            return shallow;
        }

        self.ctx.index().insert_shallow(unit, shallow.clone());
        let override_return = self.checked_override(unit, override_return);
        let completed = panic::catch_unwind(AssertUnwindSafe(|| {
            self.complete(unit, resolved, &env, shallow.clone(), declared_return, override_return)
        }));
        self.guard.borrow_mut().leave(&key);

        match completed {
            Ok(definition) => {
                self.ctx.index().complete(unit, definition.clone());
                definition
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(unit = %unit, reason = %reason, "engine: unit failed, serving signature");
                self.record(InferError::UnitFailure {
                    unit: unit.clone(),
                    reason: reason.clone(),
                });
                self.ctx.index().fail(unit, shallow.clone(), reason);
                shallow
            }
        }
    }

    fn checked_override(
        &self,
        unit: &UnitId,
        override_return: Option<Result<Type, TypeParseError>>,
    ) -> Option<Type> {
        match override_return? {
            Ok(ty) => Some(ty),
            Err(source) => {
                self.record(InferError::IncompatibleOverride {
                    unit: unit.clone(),
                    tag: self.config().override_tag.clone(),
                    source,
                });
                None
            }
        }
    }

    /// Body analysis, precedence and definition hooks on top of the signature.
    fn complete(
        &self,
        unit: &UnitId,
        resolved: &ResolvedUnit<'s>,
        env: &UnitEnv<'s>,
        mut definition: FunctionLikeDefinition,
        declared_return: Option<Type>,
        override_return: Option<Type>,
    ) -> FunctionLikeDefinition {
        let signature = definition.clone();
        let outcome = self.analyze_body(unit, resolved, env, &signature);
        let mut body_returns_receiver = false;
        let inferred = outcome.map(|outcome| {
            self.record_all(outcome.failures);
            for exception in outcome.exceptions {
                definition.add_exception(exception);
            }
            body_returns_receiver = outcome.returns_receiver;
            outcome.return_type
        });

        let signals = ReturnSignals {
            override_return,
            declared: declared_return,
            inferred,
        };
        let selection = precedence::select_return(signals, &self.reflector);
        trace!(unit = %unit, source = ?selection.source, ret = %selection.ty, "engine: return type");
        definition.return_type = selection.ty;
        definition.returns_receiver = match selection.source {
            ReturnSource::Override | ReturnSource::Declared => signature.returns_receiver,
            ReturnSource::Inferred => body_returns_receiver,
            ReturnSource::Missing => false,
        };

        self.ctx.broker().extend_definition(unit, &mut definition);
        definition
    }

    fn analyze_body(
        &self,
        unit: &UnitId,
        resolved: &ResolvedUnit<'s>,
        env: &UnitEnv<'s>,
        signature: &FunctionLikeDefinition,
    ) -> Option<BodyOutcome> {
        let mut scope = Scope::new(env.resolver().clone(), self.ctx.index());
        if !signature.is_static {
            if let Some(this) = env.self_class_type() {
                scope = scope.with_this(this.clone());
            }
        }
        for param in &signature.params {
            scope.bind(param.name.clone(), param_binding(param.ty.clone(), param.variadic));
        }
        BodyAnalyzer::new(self, unit, env).analyze(resolved.decl, &mut scope)
    }

    // =========================================================================
    // Classes
    // =========================================================================

    /// Declared templates of `class`; empty for unknown classes.
    pub fn class_templates(&self, class: &str) -> Vec<TemplateType> {
        match self.reflector.class(class) {
            Some(handle) => UnitEnv::for_class(&self.reflector, handle)
                .templates()
                .to_vec(),
            None => Vec::new(),
        }
    }

    /// Type of property `name` as seen on `class`, searched in resolution
    /// order: `@var`, then the native hint, then the widened default.
    pub fn property_type(&self, class: &str, name: &str) -> Option<Type> {
        self.reflector
            .resolution_order(class)
            .into_iter()
            .find_map(|handle| {
                let property = handle.decl.property(name)?;
                let env = UnitEnv::for_class(&self.reflector, handle);
                Some(self.declared_property_type(&handle.decl.name, property, &env))
            })
    }

    fn declared_property_type(
        &self,
        class: &str,
        property: &PropertyDecl,
        env: &UnitEnv<'_>,
    ) -> Type {
        let unit = UnitId::method(class, &format!("${}", property.name));
        if let Some(doc) = &property.doc {
            match DocBlock::parse(doc.text()).var_type(env) {
                Some(Ok(ty)) => return ty,
                Some(Err(source)) => self.record(InferError::IncompatibleOverride {
                    unit: unit.clone(),
                    tag: "var".to_string(),
                    source,
                }),
                None => {}
            }
        }
        let mut failures = Vec::new();
        let hinted = hint_type(&unit, property.hint.as_ref(), env, &mut failures);
        self.record_all(failures);
        hinted
            .or_else(|| {
                property
                    .default
                    .as_ref()
                    .and_then(|default| constant_type(default, env))
                    .map(|ty| ty.widen())
            })
            .unwrap_or(Type::Unknown)
    }

    /// Templates, properties and every visible method of `class`.
    pub fn class_definition(&self, class: &str) -> Option<ClassDefinition> {
        let handle = self.reflector.class(class)?;
        let env = UnitEnv::for_class(&self.reflector, handle);
        let mut definition = ClassDefinition::new(handle.decl.name.clone());
        definition.parent = self.reflector.parent_name(handle);
        definition.templates = env.templates().to_vec();

        for member in self.reflector.resolution_order(class) {
            let member_env = UnitEnv::for_class(&self.reflector, member);
            for property in &member.decl.properties {
                if definition.properties.contains_key(&property.name) {
                    continue;
                }
                let ty = self.declared_property_type(&member.decl.name, property, &member_env);
                definition.properties.insert(property.name.clone(), ty);
            }
            for method in &member.decl.methods {
                let key = method.name.to_ascii_lowercase();
                if definition.methods.contains_key(&key) {
                    continue;
                }
                match self.method_definition(&handle.decl.name, &method.name) {
                    Ok(built) => {
                        definition.methods.insert(key, built);
                    }
                    Err(err) => self.record(err),
                }
            }
        }
        Some(definition)
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Type of a single expression evaluated in `scope`, outside any unit.
    pub fn infer_expression(&self, expr: &Expr, scope: &mut Scope<'_>) -> Type {
        let unit = UnitId::Script;
        let env = UnitEnv::new(scope.resolver().clone(), self.source);
        let mut analyzer = BodyAnalyzer::new(self, &unit, &env);
        let ty = analyzer.infer_expr(expr, scope);
        self.record_all(std::mem::take(&mut analyzer.failures));
        ty
    }

    // =========================================================================
    // Runs
    // =========================================================================

    /// Build the definitions of `units`, isolating failures per unit.
    pub fn analyze(&self, units: &[UnitId]) -> AnalysisReport {
        let mut report = AnalysisReport::default();
        for unit in units {
            // Each requested unit starts with fresh iteration and depth counters.
            self.guard.borrow_mut().reset();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.definition(unit)));
            let mut failures = self.take_failures();
            match outcome {
                Ok(Ok(definition)) => match self.ctx.index().failure(&definition.defining_unit) {
                    Some(reason) => {
                        let failing = definition.defining_unit;
                        let reported = report.failures.iter().chain(&failures).any(|failure| {
                            matches!(failure, InferError::UnitFailure { unit, .. }
                                if unit.normalized() == failing.normalized())
                        });
                        if !reported {
                            failures.push(InferError::UnitFailure {
                                unit: failing,
                                reason,
                            });
                        }
                    }
                    None => {
                        report.definitions.insert(unit.clone(), definition);
                    }
                },
                Ok(Err(err)) => failures.push(err),
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    warn!(unit = %unit, reason = %reason, "engine: unit failed");
                    failures.push(InferError::UnitFailure {
                        unit: unit.clone(),
                        reason,
                    });
                }
            }
            report.failures.extend(failures);
        }
        debug!(
            definitions = report.definitions.len(),
            failures = report.failures.len(),
            "engine: run finished"
        );
        report
    }

    /// `analyze` over every function and every declared method.
    pub fn analyze_all(&self) -> AnalysisReport {
        let functions = self
            .source
            .functions()
            .map(|handle| UnitId::function(&handle.decl.name));
        let methods = self.source.classes().flat_map(|handle| {
            handle
                .decl
                .methods
                .iter()
                .map(move |method| UnitId::method(&handle.decl.name, &method.name))
        });
        let units: Vec<UnitId> = functions.chain(methods).collect();
        self.analyze(&units)
    }

    fn record(&self, failure: InferError) {
        trace!(failure = %failure, "engine: failure recorded");
        self.failures.borrow_mut().push(failure);
    }

    fn record_all(&self, failures: Vec<InferError>) {
        for failure in failures {
            self.record(failure);
        }
    }

    /// Failures recorded since the last call.
    pub fn take_failures(&self) -> Vec<InferError> {
        std::mem::take(&mut *self.failures.borrow_mut())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

#[cfg(test)]
#[path = "../tests/engine_tests.rs"]
mod tests;
