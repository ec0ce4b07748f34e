//! Extension broker: ordered, pluggable inference hooks.
//!
//! Two kinds of extensions exist:
//!
//! | Kind | Input | Effect |
//! |------|-------|--------|
//! | `Extension::Definition` | unit id + built definition | extra thrown types (additive only) |
//! | `Extension::Expression` | one expression + current scope | a definitive type, or defer |
//!
//! Extensions are tried in registration order. For expressions, the first
//! definitive answer wins and the built-in inference for that node is
//! skipped. Definition extensions all run; their contributions are appended
//! to the exception set, which never shrinks.

use scry_ast::Expr;
use scry_types::Type;
use tracing::trace;

use crate::definition::{FunctionLikeDefinition, UnitId};
use crate::scope::Scope;

/// Expression-level hook.
pub trait ExpressionTypeHook {
    /// `Some(ty)` to decide the expression's type, `None` to defer.
    fn infer(&self, expr: &Expr, scope: &Scope<'_>) -> Option<Type>;
}

/// Unit-level hook.
pub trait DefinitionHook {
    /// Extra exception types for the unit. Returning nothing is the
    /// common case.
    fn exceptions(&self, unit: &UnitId, definition: &FunctionLikeDefinition) -> Vec<Type>;
}

pub enum Extension {
    Definition(Box<dyn DefinitionHook>),
    Expression(Box<dyn ExpressionTypeHook>),
}

impl Extension {
    pub fn expression(hook: impl ExpressionTypeHook + 'static) -> Self {
        Self::Expression(Box::new(hook))
    }

    pub fn definition(hook: impl DefinitionHook + 'static) -> Self {
        Self::Definition(Box::new(hook))
    }
}

impl std::fmt::Debug for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Definition(_) => f.write_str("Extension::Definition"),
            Self::Expression(_) => f.write_str("Extension::Expression"),
        }
    }
}

#[derive(Debug, Default)]
pub struct ExtensionBroker {
    extensions: Vec<Extension>,
}

impl ExtensionBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an extension; earlier registrations have priority.
    pub fn register(&mut self, extension: Extension) {
        self.extensions.push(extension);
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// First definitive answer of the expression hooks.
    pub fn infer_expression(&self, expr: &Expr, scope: &Scope<'_>) -> Option<Type> {
        self.extensions.iter().enumerate().find_map(|(i, extension)| {
            let Extension::Expression(hook) = extension else {
                return None;
            };
            let ty = hook.infer(expr, scope)?;
            trace!(hook = i, ty = %ty, "broker: expression hook decided");
            Some(ty)
        })
    }

    /// Let every definition hook append exceptions to `definition`.
    pub fn extend_definition(&self, unit: &UnitId, definition: &mut FunctionLikeDefinition) {
        for extension in &self.extensions {
            if let Extension::Definition(hook) = extension {
                for exception in hook.exceptions(unit, definition) {
                    trace!(unit = %unit, exception = %exception, "broker: extra exception");
                    definition.add_exception(exception);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/broker_tests.rs"]
mod tests;
