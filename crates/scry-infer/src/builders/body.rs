//! Body-dataflow builder.
//!
//! A single forward pass over a unit's statements. Nothing is executed:
//! each expression is mapped to a type (see `expr.rs`), assignments update
//! the `Scope`, and control flow is handled structurally:
//!
//! - statements after `return`/`throw` in the same block are skipped
//! - `if`/`elseif`/`else`, loops and `try`/`catch` analyse each branch from
//!   the same starting bindings and merge the live branches afterwards
//! - thrown types are filtered through the enclosing `catch` clauses
//!
//! The collected return types become the unit's inferred return type,
//! widened according to `LiteralWidening`.

use scry_ast::{CatchClause, ElseIf, Expr, FunctionDecl, Stmt};
use scry_types::{ClassHierarchy, KeyedArrayType, Type, Union};
use tracing::trace;

use super::UnitEnv;
use crate::config::LiteralWidening;
use crate::definition::UnitId;
use crate::engine::Engine;
use crate::error::InferError;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::scope::{Bindings, Scope, merge_bindings};

/// Whether control reaches the end of a statement list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continues,
    Terminates,
}

/// Returns and throws collected for one function-like body.
#[derive(Debug, Default)]
pub(crate) struct Frame {
    returns: Vec<Type>,
    bare_return: bool,
    /// Some `return` yields the late-static receiver.
    returns_receiver: bool,
    thrown: Vec<Type>,
    /// Canonical class names of the enclosing `catch` clauses, innermost last.
    catches: Vec<Vec<String>>,
}

/// Result of analysing one body.
#[derive(Debug)]
pub struct BodyOutcome {
    pub return_type: Type,
    pub returns_receiver: bool,
    pub exceptions: Vec<Type>,
    pub failures: Vec<InferError>,
}

pub struct BodyAnalyzer<'e, 's> {
    pub(crate) engine: &'e Engine<'s>,
    pub(crate) unit: &'e UnitId,
    pub(crate) env: &'e UnitEnv<'e>,
    pub(crate) frame: Frame,
    pub(crate) nesting: DepthCounter,
    pub(crate) failures: Vec<InferError>,
}

impl<'e, 's> BodyAnalyzer<'e, 's> {
    pub fn new(engine: &'e Engine<'s>, unit: &'e UnitId, env: &'e UnitEnv<'e>) -> Self {
        Self {
            engine,
            unit,
            env,
            frame: Frame::default(),
            nesting: DepthCounter::with_profile(RecursionProfile::ExpressionNesting),
            failures: Vec::new(),
        }
    }

    /// Analyse the body of `decl`. `None` for bodiless declarations.
    pub fn analyze(mut self, decl: &FunctionDecl, scope: &mut Scope<'_>) -> Option<BodyOutcome> {
        let body = decl.body.as_ref()?;
        let flow = self.walk_block(body, scope);
        let frame = std::mem::take(&mut self.frame);
        let return_type = self.finish_returns(frame.returns, frame.bare_return, flow);
        trace!(unit = %self.unit, ret = %return_type, "body: analysed");
        Some(BodyOutcome {
            return_type,
            returns_receiver: frame.returns_receiver,
            exceptions: frame.thrown,
            failures: self.failures,
        })
    }

    /// Analyse a nested function-like body (closure) with its own frame.
    /// Returns the inferred return type and the exceptions it may throw.
    pub(crate) fn analyze_nested(
        &mut self,
        body: &[Stmt],
        scope: &mut Scope<'_>,
    ) -> (Type, Vec<Type>) {
        let outer = std::mem::take(&mut self.frame);
        let flow = self.walk_block(body, scope);
        let frame = std::mem::replace(&mut self.frame, outer);
        (
            self.finish_returns(frame.returns, frame.bare_return, flow),
            frame.thrown,
        )
    }

    /// Evaluate `expr` with a fresh frame; returns its type and what it throws.
    pub(crate) fn evaluate_nested(
        &mut self,
        expr: &Expr,
        scope: &mut Scope<'_>,
    ) -> (Type, Vec<Type>) {
        let outer = std::mem::take(&mut self.frame);
        let ty = self.infer_expr(expr, scope);
        let frame = std::mem::replace(&mut self.frame, outer);
        (ty, frame.thrown)
    }

    fn finish_returns(&self, returns: Vec<Type>, bare_return: bool, flow: Flow) -> Type {
        if returns.is_empty() {
            return Type::Void;
        }
        let falls_through = bare_return || flow == Flow::Continues;
        let merged = Union::wrap(returns.into_iter().chain(falls_through.then_some(Type::Null)));
        match self.engine.config().literal_widening {
            LiteralWidening::Never => merged,
            LiteralWidening::Always => merged.widen(),
            LiteralWidening::WhenMerging if merged.is_union() => merged.widen(),
            LiteralWidening::WhenMerging => merged,
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn walk_block(&mut self, stmts: &[Stmt], scope: &mut Scope<'_>) -> Flow {
        for stmt in stmts {
            if self.walk_stmt(stmt, scope) == Flow::Terminates {
                return Flow::Terminates;
            }
        }
        Flow::Continues
    }

    fn walk_stmt(&mut self, stmt: &Stmt, scope: &mut Scope<'_>) -> Flow {
        match stmt {
            Stmt::Expr(expr) => {
                self.infer_expr(expr, scope);
                if matches!(expr, Expr::Throw(_)) {
                    Flow::Terminates
                } else {
                    Flow::Continues
                }
            }
            Stmt::Return(Some(expr)) => {
                let ty = self.infer_expr(expr, scope);
                if self.yields_receiver(expr) {
                    self.frame.returns_receiver = true;
                }
                self.frame.returns.push(ty);
                Flow::Terminates
            }
            Stmt::Return(None) => {
                self.frame.bare_return = true;
                Flow::Terminates
            }
            Stmt::If {
                condition,
                then,
                else_ifs,
                otherwise,
            } => self.walk_if(condition, then, else_ifs, otherwise.as_deref(), scope),
            Stmt::Foreach {
                subject,
                key,
                value,
                body,
            } => {
                let subject = self.infer_expr(subject, scope);
                let (key_type, value_type) = iteration_types(&subject);
                let before = scope.snapshot();
                if let Some(key) = key {
                    scope.bind(key.clone(), key_type);
                }
                scope.bind(value.clone(), value_type);
                self.walk_loop_body(body, before, scope)
            }
            Stmt::While { condition, body } => {
                self.infer_expr(condition, scope);
                let before = scope.snapshot();
                self.walk_loop_body(body, before, scope)
            }
            Stmt::TryCatch {
                body,
                catches,
                finally,
            } => self.walk_try(body, catches, finally.as_deref(), scope),
            Stmt::Block(stmts) => self.walk_block(stmts, scope),
            Stmt::Nop => Flow::Continues,
        }
    }

    fn walk_if(
        &mut self,
        condition: &Expr,
        then: &[Stmt],
        else_ifs: &[ElseIf],
        otherwise: Option<&[Stmt]>,
        scope: &mut Scope<'_>,
    ) -> Flow {
        self.infer_expr(condition, scope);
        let entry = scope.snapshot();
        let mut live: Vec<Bindings> = Vec::new();

        if self.walk_block(then, scope) == Flow::Continues {
            live.push(scope.snapshot());
        }
        for branch in else_ifs {
            scope.restore(entry.clone());
            self.infer_expr(&branch.condition, scope);
            if self.walk_block(&branch.body, scope) == Flow::Continues {
                live.push(scope.snapshot());
            }
        }
        match otherwise {
            Some(otherwise) => {
                scope.restore(entry.clone());
                if self.walk_block(otherwise, scope) == Flow::Continues {
                    live.push(scope.snapshot());
                }
            }
            None => live.push(entry.clone()),
        }

        if live.is_empty() {
            scope.restore(entry);
            return Flow::Terminates;
        }
        scope.restore(merge_bindings(&live));
        Flow::Continues
    }

    /// A loop body runs zero or more times.
    fn walk_loop_body(&mut self, body: &[Stmt], before: Bindings, scope: &mut Scope<'_>) -> Flow {
        self.walk_block(body, scope);
        let after = scope.snapshot();
        scope.restore(merge_bindings(&[before, after]));
        Flow::Continues
    }

    fn walk_try(
        &mut self,
        body: &[Stmt],
        catches: &[CatchClause],
        finally: Option<&[Stmt]>,
        scope: &mut Scope<'_>,
    ) -> Flow {
        let caught: Vec<String> = catches
            .iter()
            .flat_map(|clause| clause.types.iter())
            .map(|name| self.env.resolve_class(name))
            .collect();
        let entry = scope.snapshot();

        self.frame.catches.push(caught);
        let body_flow = self.walk_block(body, scope);
        self.frame.catches.pop();

        let after_body = scope.snapshot();
        let mut live: Vec<Bindings> = Vec::new();
        if body_flow == Flow::Continues {
            live.push(after_body.clone());
        }

        // The body may have failed anywhere.
        let at_throw = merge_bindings(&[entry.clone(), after_body]);
        for clause in catches {
            scope.restore(at_throw.clone());
            if let Some(var) = &clause.var {
                let ty = Union::wrap(
                    clause
                        .types
                        .iter()
                        .map(|name| Type::object(self.env.resolve_class(name))),
                );
                scope.bind(var.clone(), ty);
            }
            if self.walk_block(&clause.body, scope) == Flow::Continues {
                live.push(scope.snapshot());
            }
        }

        let flow = if live.is_empty() {
            scope.restore(entry);
            Flow::Terminates
        } else {
            scope.restore(merge_bindings(&live));
            Flow::Continues
        };

        match finally {
            Some(finally) if self.walk_block(finally, scope) == Flow::Terminates => Flow::Terminates,
            _ => flow,
        }
    }

    // =========================================================================
    // Exceptions and failures
    // =========================================================================

    /// Record a thrown type unless an enclosing `catch` handles it.
    pub(crate) fn record_thrown(&mut self, thrown: &Type) {
        let engine = self.engine;
        let hierarchy: &dyn ClassHierarchy = engine.reflector();
        for member in thrown.members() {
            let Some(class) = member.class_name() else {
                continue;
            };
            let caught = self.frame.catches.iter().any(|clauses| {
                clauses
                    .iter()
                    .any(|catch| hierarchy.is_subclass_of(class, catch))
            });
            if caught {
                trace!(unit = %self.unit, exception = %member, "body: caught locally");
                continue;
            }
            if !self.frame.thrown.iter().any(|known| known.is_same(member)) {
                self.frame.thrown.push(member.clone());
            }
        }
    }

    pub(crate) fn unanalyzable(&mut self, construct: impl Into<String>) {
        self.failures.push(InferError::Unanalyzable {
            unit: self.unit.clone(),
            construct: construct.into(),
        });
    }
}

/// Key and value types produced by iterating over `subject`.
pub(crate) fn iteration_types(subject: &Type) -> (Type, Type) {
    match subject {
        Type::Array(array) => ((*array.key).clone(), (*array.value).clone()),
        Type::KeyedArray(shape) if shape.is_empty() => (Type::Unknown, Type::Unknown),
        Type::KeyedArray(shape) => (shape.key_type(), shape.value_type()),
        Type::Generic(generic) => match generic.args.as_slice() {
            [value] => (Type::Mixed, value.clone()),
            [key, value] => (key.clone(), value.clone()),
            _ => (Type::Mixed, Type::Mixed),
        },
        Type::Union(union) => {
            let (keys, values): (Vec<Type>, Vec<Type>) = union
                .iter()
                .filter(|member| !matches!(member, Type::Null))
                .map(iteration_types)
                .unzip();
            (Union::wrap(keys), Union::wrap(values))
        }
        Type::Mixed => (Type::Mixed, Type::Mixed),
        _ => (Type::Unknown, Type::Unknown),
    }
}

/// Type a parameter has inside the body: variadics collect into a list.
pub(crate) fn param_binding(ty: Type, variadic: bool) -> Type {
    if variadic { Type::list_of(ty) } else { ty }
}

/// An empty keyed array, the starting value of `$a[] = ...` on an unset
/// variable.
pub(crate) fn empty_shape() -> KeyedArrayType {
    KeyedArrayType::new(Vec::new())
}

#[cfg(test)]
#[path = "../../tests/body_tests.rs"]
mod tests;
